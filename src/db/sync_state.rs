use crate::db::operation::from_unix;
use crate::db::StoreError;
use crate::models::SyncState;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};

pub async fn get_sync_state(pool: &Pool<Sqlite>) -> Result<SyncState, StoreError> {
    let row = sqlx::query(
        "SELECT last_block, last_irreversible_block, updated_at FROM sync_state WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(SyncState::zero());
    };

    Ok(SyncState {
        last_block: row.get::<i64, _>("last_block") as u64,
        last_irreversible_block: row.get::<i64, _>("last_irreversible_block") as u64,
        updated_at: from_unix(row.get("updated_at"))?,
    })
}

/// Single-statement compare-and-raise: `last_block` never moves backwards,
/// whatever order concurrent writers land in.
pub async fn advance_sync_state(
    pool: &Pool<Sqlite>,
    last_block: u64,
    latest_irreversible: u64,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO sync_state (id, last_block, last_irreversible_block, updated_at)
        VALUES (1, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            last_block = MAX(sync_state.last_block, excluded.last_block),
            last_irreversible_block = excluded.last_irreversible_block,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(last_block as i64)
    .bind(latest_irreversible as i64)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?;

    Ok(())
}
