//! tests/store_tests.rs - SQLite operation store and sync cursor

use crate::db::{OperationStore, SqliteStore};
use crate::tests::support::operation;
use serde_json::json;

async fn store() -> SqliteStore {
    SqliteStore::in_memory()
        .await
        .expect("Failed to open in-memory store")
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let store = store().await;
    let op = operation(10, "aa", "alice", "transfer", json!({"from": "alice", "to": "bob"}));

    store.upsert(&[op.clone()]).await.unwrap();
    store.upsert(&[op.clone()]).await.unwrap();

    let page = store.query(None, None, 1, 20).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.operations[0].key(), op.key());
}

#[tokio::test]
async fn redelivery_overwrites_payload_but_keeps_created_at() {
    let store = store().await;
    let first = operation(10, "aa", "alice", "transfer", json!({"amount": "1.000 STEEM"}));
    store.upsert(&[first.clone()]).await.unwrap();
    let created = store.query(None, None, 1, 20).await.unwrap().operations[0].created_at;

    let mut second = first.clone();
    second.op_data = json!({"amount": "2.000 STEEM"}).as_object().cloned().unwrap();
    store.upsert(&[second]).await.unwrap();

    let page = store.query(None, None, 1, 20).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.operations[0].op_data["amount"], "2.000 STEEM");
    assert_eq!(page.operations[0].created_at, created);
}

#[tokio::test]
async fn same_operation_for_two_accounts_is_two_rows() {
    let store = store().await;
    let data = json!({"from": "alice", "to": "bob"});
    store
        .upsert(&[
            operation(10, "aa", "alice", "transfer", data.clone()),
            operation(10, "aa", "bob", "transfer", data),
        ])
        .await
        .unwrap();

    assert_eq!(store.query(None, None, 1, 20).await.unwrap().total, 2);
    assert_eq!(store.tracked_accounts().await.unwrap(), vec!["alice", "bob"]);
}

#[tokio::test]
async fn cursor_starts_at_zero() {
    let store = store().await;
    let state = store.get_cursor().await.unwrap();
    assert_eq!(state.last_block, 0);
    assert_eq!(state.last_irreversible_block, 0);
}

#[tokio::test]
async fn cursor_never_moves_backwards() {
    let store = store().await;

    store.advance_cursor(100, 120).await.unwrap();
    store.advance_cursor(90, 125).await.unwrap();

    let state = store.get_cursor().await.unwrap();
    assert_eq!(state.last_block, 100);
    assert_eq!(state.last_irreversible_block, 125);

    store.advance_cursor(101, 125).await.unwrap();
    assert_eq!(store.get_cursor().await.unwrap().last_block, 101);
}

#[tokio::test]
async fn query_orders_newest_first_and_paginates() {
    let store = store().await;
    let ops: Vec<_> = (1..=5)
        .map(|n| operation(n, &format!("t{}", n), "alice", "vote", json!({"voter": "alice"})))
        .collect();
    store.upsert(&ops).await.unwrap();

    let first = store.query(Some("alice"), None, 1, 2).await.unwrap();
    let blocks: Vec<u64> = first.operations.iter().map(|o| o.block_num).collect();
    assert_eq!(blocks, vec![5, 4]);
    assert_eq!(first.total, 5);
    assert!(first.has_more);

    let last = store.query(Some("alice"), None, 3, 2).await.unwrap();
    assert_eq!(last.operations.len(), 1);
    assert_eq!(last.operations[0].block_num, 1);
    assert!(!last.has_more);

    let beyond = store.query(Some("alice"), None, 4, 2).await.unwrap();
    assert!(beyond.operations.is_empty());
    assert!(!beyond.has_more);
}

#[tokio::test]
async fn query_filters_by_account_and_type() {
    let store = store().await;
    store
        .upsert(&[
            operation(1, "a", "alice", "transfer", json!({"from": "alice"})),
            operation(2, "b", "alice", "vote", json!({"voter": "alice"})),
            operation(3, "c", "bob", "transfer", json!({"from": "bob"})),
        ])
        .await
        .unwrap();

    assert_eq!(store.query(Some("alice"), None, 1, 20).await.unwrap().total, 2);
    assert_eq!(store.query(None, Some("transfer"), 1, 20).await.unwrap().total, 2);

    let both = store
        .query(Some("bob"), Some("transfer"), 1, 20)
        .await
        .unwrap();
    assert_eq!(both.total, 1);
    assert_eq!(both.operations[0].trx_id, "c");

    assert_eq!(store.query(Some("carol"), None, 1, 20).await.unwrap().total, 0);
}

#[tokio::test]
async fn store_on_disk_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("ops.db").display());

    {
        let store = SqliteStore::open(&url).await.unwrap();
        store.advance_cursor(42, 50).await.unwrap();
        store.pool().close().await;
    }

    let store = SqliteStore::open(&url).await.unwrap();
    assert_eq!(store.get_cursor().await.unwrap().last_block, 42);
}
