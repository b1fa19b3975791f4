use sqlx::{Pool, Row, Sqlite};

pub async fn get_all_tracked_accounts(pool: &Pool<Sqlite>) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT DISTINCT account FROM operations ORDER BY account ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.get("account")).collect())
}
