//! Shared fixtures: a scripted chain source and a recording notification sink.

use crate::blockchain::client::{ChainError, ChainSource};
use crate::blockchain::models::{OperationObject, RawBlock};
use crate::models::Operation;
use crate::notify::{NotificationSink, NotifyError};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory chain. Blocks absent from the map are silently left out of
/// `get_blocks` results, which lets tests model a source that skips blocks.
#[derive(Default)]
pub struct MockChain {
    blocks: Mutex<HashMap<u64, RawBlock>>,
    virtual_ops: Mutex<HashMap<u64, Vec<OperationObject>>>,
    latest_irreversible: AtomicU64,
    fail_on_block: Mutex<Option<u64>>,
    pub fetch_calls: AtomicU64,
}

impl MockChain {
    pub fn new(latest_irreversible: u64) -> Self {
        Self {
            latest_irreversible: AtomicU64::new(latest_irreversible),
            ..Default::default()
        }
    }

    pub fn with_block(self, block_num: u64, block: RawBlock) -> Self {
        self.blocks.lock().unwrap().insert(block_num, block);
        self
    }

    pub fn with_empty_blocks(self, range: std::ops::RangeInclusive<u64>) -> Self {
        {
            let mut blocks = self.blocks.lock().unwrap();
            for n in range {
                blocks.entry(n).or_insert_with(|| block_with_ops(&[]));
            }
        }
        self
    }

    pub fn with_virtual_ops(self, block_num: u64, ops: Vec<OperationObject>) -> Self {
        self.virtual_ops.lock().unwrap().insert(block_num, ops);
        self
    }

    /// Any `get_blocks` window containing `block_num` fails.
    pub fn fail_on(&self, block_num: Option<u64>) {
        *self.fail_on_block.lock().unwrap() = block_num;
    }

    pub fn set_latest_irreversible(&self, n: u64) {
        self.latest_irreversible.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainSource for MockChain {
    async fn get_block(&self, block_num: u64) -> Result<RawBlock, ChainError> {
        self.blocks
            .lock()
            .unwrap()
            .get(&block_num)
            .cloned()
            .ok_or(ChainError::BlockNotFound(block_num))
    }

    async fn get_blocks(
        &self,
        from: u64,
        to_exclusive: u64,
    ) -> Result<Vec<(u64, RawBlock)>, ChainError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(bad) = *self.fail_on_block.lock().unwrap() {
            if (from..to_exclusive).contains(&bad) {
                return Err(ChainError::UnexpectedResponse(format!(
                    "injected failure at block {}",
                    bad
                )));
            }
        }

        let blocks = self.blocks.lock().unwrap();
        Ok((from..to_exclusive)
            .filter_map(|n| blocks.get(&n).cloned().map(|b| (n, b)))
            .collect())
    }

    async fn get_latest_irreversible_block_number(&self) -> Result<u64, ChainError> {
        Ok(self.latest_irreversible.load(Ordering::SeqCst))
    }

    async fn get_ops_in_block(
        &self,
        block_num: u64,
        _only_virtual: bool,
    ) -> Result<Vec<OperationObject>, ChainError> {
        Ok(self
            .virtual_ops
            .lock()
            .unwrap()
            .get(&block_num)
            .cloned()
            .unwrap_or_default())
    }
}

/// Collects every message sent; optionally fails every send.
#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Api("chat not found".to_string()));
        }
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// A block with one transaction per entry in `ops`, in condenser shape.
pub fn block_with_ops(ops: &[Value]) -> RawBlock {
    let transactions: Vec<Value> = ops
        .iter()
        .enumerate()
        .map(|(i, op)| {
            json!({
                "operations": [op],
                "transaction_id": format!("{:040x}", i + 1),
                "transaction_num": i,
            })
        })
        .collect();

    serde_json::from_value(json!({
        "previous": "0000000000000000000000000000000000000000",
        "timestamp": "2024-05-01T12:00:00",
        "witness": "initminer",
        "transactions": transactions,
    }))
    .unwrap()
}

pub fn transfer(from: &str, to: &str, amount: &str) -> Value {
    json!(["transfer", {"from": from, "to": to, "amount": amount, "memo": ""}])
}

pub fn operation(block_num: u64, trx_id: &str, account: &str, op_type: &str, data: Value) -> Operation {
    Operation {
        block_num,
        trx_id: trx_id.to_string(),
        op_in_trx: 0,
        account: account.to_string(),
        op_type: op_type.to_string(),
        op_data: data.as_object().cloned().unwrap(),
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(block_num as i64 * 3),
        created_at: None,
    }
}
