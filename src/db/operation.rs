use crate::db::StoreError;
use crate::models::{Operation, OperationPage};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub async fn upsert_operations(
    pool: &Pool<Sqlite>,
    operations: &[Operation],
) -> Result<(), StoreError> {
    if operations.is_empty() {
        return Ok(());
    }

    let now = Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for op in operations {
        let op_data = serde_json::to_string(&op.op_data)?;

        // created_at keeps the first ingestion time; everything else is last-write-wins.
        sqlx::query(
            r#"
            INSERT INTO operations
            (block_num, trx_id, op_in_trx, account, op_type, op_data, timestamp, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(block_num, trx_id, op_in_trx, account) DO UPDATE SET
                op_type = excluded.op_type,
                op_data = excluded.op_data,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(op.block_num as i64)
        .bind(&op.trx_id)
        .bind(op.op_in_trx as i64)
        .bind(&op.account)
        .bind(&op.op_type)
        .bind(op_data)
        .bind(op.timestamp.timestamp())
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

pub async fn get_operations(
    pool: &Pool<Sqlite>,
    account: Option<&str>,
    op_type: Option<&str>,
    page: u32,
    page_size: u32,
) -> Result<OperationPage, StoreError> {
    let total = sqlx::query(
        "SELECT COUNT(*) FROM operations
         WHERE (? IS NULL OR account = ?)
         AND (? IS NULL OR op_type = ?)",
    )
    .bind(account)
    .bind(account)
    .bind(op_type)
    .bind(op_type)
    .fetch_one(pool)
    .await?
    .get::<i64, _>(0) as u64;

    let offset = (page.max(1) as i64 - 1) * page_size as i64;

    let rows = sqlx::query(
        r#"SELECT block_num, trx_id, op_in_trx, account, op_type, op_data, timestamp, created_at
           FROM operations
           WHERE (? IS NULL OR account = ?)
           AND (? IS NULL OR op_type = ?)
           ORDER BY block_num DESC, timestamp DESC, id DESC
           LIMIT ? OFFSET ?"#,
    )
    .bind(account)
    .bind(account)
    .bind(op_type)
    .bind(op_type)
    .bind(page_size as i64)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let operations = rows
        .iter()
        .map(row_to_operation)
        .collect::<Result<Vec<_>, _>>()?;

    let has_more = (offset as u64) + (operations.len() as u64) < total;

    Ok(OperationPage {
        operations,
        total,
        page,
        page_size,
        has_more,
    })
}

fn row_to_operation(row: &SqliteRow) -> Result<Operation, StoreError> {
    let op_data: String = row.get("op_data");
    let op_data: Map<String, Value> = serde_json::from_str(&op_data)?;

    Ok(Operation {
        block_num: row.get::<i64, _>("block_num") as u64,
        trx_id: row.get("trx_id"),
        op_in_trx: row.get::<i64, _>("op_in_trx") as u32,
        account: row.get("account"),
        op_type: row.get("op_type"),
        op_data,
        timestamp: from_unix(row.get("timestamp"))?,
        created_at: Some(from_unix(row.get("created_at"))?),
    })
}

pub(crate) fn from_unix(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {}", secs)))
}
