use crate::blockchain::models::{
    decode_operation, is_missing_trx_id, parse_chain_timestamp, regular_trx_id, virtual_trx_id,
    OperationObject, RawBlock,
};
use crate::blockchain::participants::extract_participants;
use crate::models::Operation;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Turns raw chain data into per-account [`Operation`] records.
///
/// Holds only the immutable tracked-account set and performs no I/O, so one
/// instance can be shared by the live engine and any bounded re-processing.
#[derive(Debug, Clone)]
pub struct BlockProcessor {
    tracked_accounts: HashSet<String>,
}

impl BlockProcessor {
    pub fn new<I, S>(tracked_accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracked_accounts: tracked_accounts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tracked_accounts(&self) -> &HashSet<String> {
        &self.tracked_accounts
    }

    /// Extract operations nested in the transactions of `block`.
    pub fn extract(&self, block: &RawBlock, block_num: u64) -> Vec<Operation> {
        let timestamp = resolve_timestamp(block.timestamp.as_deref(), block_num);
        let mut operations = Vec::new();

        for (trx_in_block, tx) in block.transactions.iter().enumerate() {
            let trx_in_block = trx_in_block as u32;
            let chain_trx_id = tx
                .transaction_id
                .as_deref()
                .filter(|id| !is_missing_trx_id(id))
                .or_else(|| {
                    block
                        .transaction_ids
                        .get(trx_in_block as usize)
                        .map(String::as_str)
                        .filter(|id| !is_missing_trx_id(id))
                });

            for (op_in_trx, raw_op) in tx.operations.iter().enumerate() {
                let op_in_trx = op_in_trx as u32;
                let (op_type, op_data) = match decode_operation(raw_op) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        warn!(
                            "Skipping malformed operation {}/{}/{}: {}",
                            block_num, trx_in_block, op_in_trx, e
                        );
                        continue;
                    }
                };

                let trx_id = match chain_trx_id {
                    Some(id) => id.to_string(),
                    None => regular_trx_id(block_num, trx_in_block, op_in_trx),
                };

                self.push_records(
                    &mut operations,
                    block_num,
                    &trx_id,
                    op_in_trx,
                    &op_type,
                    &op_data,
                    timestamp,
                );
            }
        }

        operations
    }

    /// Extract pre-flattened operation objects, regular or virtual.
    pub fn extract_flat(&self, objects: &[OperationObject]) -> Vec<Operation> {
        let mut operations = Vec::new();

        for obj in objects {
            let (op_type, op_data) = match decode_operation(&obj.op) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(
                        "Skipping malformed operation object in block {} (vop {}): {}",
                        obj.block, obj.virtual_op, e
                    );
                    continue;
                }
            };

            // Virtual ops may carry the id of the transaction that triggered
            // them, so the virtual index always keys them.
            let trx_id = if obj.virtual_op > 0 {
                virtual_trx_id(obj.block, obj.virtual_op)
            } else if !is_missing_trx_id(&obj.trx_id) {
                obj.trx_id.clone()
            } else {
                regular_trx_id(obj.block, obj.trx_in_block, obj.op_in_trx)
            };

            let timestamp = resolve_timestamp(obj.timestamp.as_deref(), obj.block);
            self.push_records(
                &mut operations,
                obj.block,
                &trx_id,
                obj.op_in_trx,
                &op_type,
                &op_data,
                timestamp,
            );
        }

        operations
    }

    #[allow(clippy::too_many_arguments)]
    fn push_records(
        &self,
        out: &mut Vec<Operation>,
        block_num: u64,
        trx_id: &str,
        op_in_trx: u32,
        op_type: &str,
        op_data: &Map<String, Value>,
        timestamp: DateTime<Utc>,
    ) {
        for account in extract_participants(op_type, op_data) {
            if !self.tracked_accounts.contains(&account) {
                continue;
            }
            out.push(Operation {
                block_num,
                trx_id: trx_id.to_string(),
                op_in_trx,
                account,
                op_type: op_type.to_string(),
                op_data: op_data.clone(),
                timestamp,
                created_at: None,
            });
        }
    }
}

fn resolve_timestamp(raw: Option<&str>, block_num: u64) -> DateTime<Utc> {
    match raw.and_then(parse_chain_timestamp) {
        Some(ts) => ts,
        None => {
            debug!("Block {} has no usable timestamp, using current time", block_num);
            Utc::now()
        }
    }
}
