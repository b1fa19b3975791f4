use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Check a Steem account name: 3 to 16 characters, dot-separated segments of
/// at least 3 characters, each starting with a lowercase letter, containing
/// only lowercase letters, digits and hyphens, and not ending with a hyphen.
pub fn validate_account_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingParameter("account".to_string()));
    }

    let invalid = || ValidationError::InvalidAccountName(name.to_string());

    if name.len() < 3 || name.len() > 16 {
        return Err(invalid());
    }

    for segment in name.split('.') {
        let bytes = segment.as_bytes();
        if bytes.len() < 3 {
            return Err(invalid());
        }
        if !bytes[0].is_ascii_lowercase() {
            return Err(invalid());
        }
        if bytes[bytes.len() - 1] == b'-' {
            return Err(invalid());
        }
        if !bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        {
            return Err(invalid());
        }
    }

    Ok(())
}

/// Normalized 1-based pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    /// Out-of-range values fall back to defaults: page < 1 becomes 1, and a
    /// page size outside `1..=100` becomes 20.
    pub fn normalize(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p.min(u32::MAX as i64) as u32,
            _ => 1,
        };
        let page_size = match page_size {
            Some(s) if (1..=MAX_PAGE_SIZE as i64).contains(&s) => s as u32,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}
