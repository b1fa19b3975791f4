pub mod account;
pub mod connection;
pub mod migration;
pub mod operation;
pub mod store;
pub mod sync_state;

use crate::models::{Operation, OperationPage, SyncState};
use async_trait::async_trait;
use thiserror::Error;

pub use store::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode or decode op_data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Persistence boundary for extracted operations and the sync cursor.
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Idempotent batch write keyed by `(block_num, trx_id, op_in_trx, account)`.
    /// A re-delivered key overwrites the stored `op_type`, `op_data` and `timestamp`.
    async fn upsert(&self, operations: &[Operation]) -> Result<(), StoreError>;

    /// Raise `last_block` to `max(current, last_block)` and record the
    /// latest irreversible block, atomically.
    async fn advance_cursor(
        &self,
        last_block: u64,
        latest_irreversible: u64,
    ) -> Result<(), StoreError>;

    /// The stored cursor, or the zero state if none was ever written.
    async fn get_cursor(&self) -> Result<SyncState, StoreError>;

    /// Newest-first page of operations. `page` is 1-based.
    async fn query(
        &self,
        account: Option<&str>,
        op_type: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<OperationPage, StoreError>;

    /// Distinct accounts that have at least one stored operation, sorted.
    async fn tracked_accounts(&self) -> Result<Vec<String>, StoreError>;
}
