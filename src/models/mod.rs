// Operation rows, the sync cursor and paginated query results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One tracked account's involvement in one on-chain operation.
///
/// Rows are unique by [`OperationKey`]: `(block_num, trx_id, op_in_trx, account)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub block_num: u64,
    pub trx_id: String,
    pub op_in_trx: u32,
    pub account: String,
    pub op_type: String,
    pub op_data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    /// Set by the store on first insert. Always `None` on freshly extracted records.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Composite natural key of an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub block_num: u64,
    pub trx_id: String,
    pub op_in_trx: u32,
    pub account: String,
}

impl Operation {
    pub fn key(&self) -> OperationKey {
        OperationKey {
            block_num: self.block_num,
            trx_id: self.trx_id.clone(),
            op_in_trx: self.op_in_trx,
            account: self.account.clone(),
        }
    }
}

/// The durable resume cursor. There is exactly one per database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Highest block whose operations are fully persisted.
    pub last_block: u64,
    /// Highest block the chain reported as irreversible at the last advance.
    pub last_irreversible_block: u64,
    pub updated_at: DateTime<Utc>,
}

impl SyncState {
    pub fn zero() -> Self {
        Self {
            last_block: 0,
            last_irreversible_block: 0,
            updated_at: Utc::now(),
        }
    }
}

// Query response model
#[derive(Debug, Clone, Serialize)]
pub struct OperationPage {
    pub operations: Vec<Operation>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}
