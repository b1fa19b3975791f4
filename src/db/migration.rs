use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // One row per (operation, tracked participant)
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS operations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            block_num INTEGER NOT NULL,
            trx_id TEXT NOT NULL,
            op_in_trx INTEGER NOT NULL,
            account TEXT NOT NULL,
            op_type TEXT NOT NULL,
            op_data TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE (block_num, trx_id, op_in_trx, account)
        )",
    )
    .execute(pool)
    .await?;

    // Singleton cursor row
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sync_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_block INTEGER NOT NULL DEFAULT 0,
            last_irreversible_block INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Add indexes for common queries
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_operations_account_block
         ON operations(account, block_num DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_operations_op_type
         ON operations(op_type)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_operations_timestamp
         ON operations(timestamp DESC)",
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
