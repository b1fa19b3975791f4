use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum LockError {
    #[error("failed to open lock file {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("lock {path} is held by another instance: {source}")]
    Held {
        path: String,
        source: std::io::Error,
    },
}

/// Exclusive advisory lock on a file, held until dropped.
///
/// Only one sync process may advance the cursor at a time.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Take the lock without blocking. Fails if any other holder exists.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let path = path.as_ref().to_path_buf();
        let lock_path = path.display().to_string();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| LockError::Open {
                path: lock_path.clone(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: lock_path.clone(),
                source,
            })?;

        file.try_lock_exclusive().map_err(|source| LockError::Held {
            path: lock_path.clone(),
            source,
        })?;

        // PID is informational only.
        if let Err(e) = file
            .set_len(0)
            .and_then(|_| writeln!(file, "{}", std::process::id()))
            .and_then(|_| file.sync_all())
        {
            warn!("Failed to write PID to lock file {}: {}", lock_path, e);
        }

        info!("Lock acquired: {}", lock_path);
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
        info!("Lock released: {}", self.path.display());
    }
}
