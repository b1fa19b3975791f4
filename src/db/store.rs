use crate::db::{account, connection, operation, sync_state, OperationStore, StoreError};
use crate::models::{Operation, OperationPage, SyncState};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

/// [`OperationStore`] backed by SQLite.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and ensure the schema.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = connection::establish_connection(database_url).await?;
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = connection::in_memory().await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl OperationStore for SqliteStore {
    async fn upsert(&self, operations: &[Operation]) -> Result<(), StoreError> {
        operation::upsert_operations(&self.pool, operations).await?;
        if !operations.is_empty() {
            debug!("Upserted {} operations", operations.len());
        }
        Ok(())
    }

    async fn advance_cursor(
        &self,
        last_block: u64,
        latest_irreversible: u64,
    ) -> Result<(), StoreError> {
        sync_state::advance_sync_state(&self.pool, last_block, latest_irreversible).await
    }

    async fn get_cursor(&self) -> Result<SyncState, StoreError> {
        sync_state::get_sync_state(&self.pool).await
    }

    async fn query(
        &self,
        account: Option<&str>,
        op_type: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<OperationPage, StoreError> {
        operation::get_operations(&self.pool, account, op_type, page, page_size).await
    }

    async fn tracked_accounts(&self) -> Result<Vec<String>, StoreError> {
        Ok(account::get_all_tracked_accounts(&self.pool).await?)
    }
}
