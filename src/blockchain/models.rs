use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A block as returned by `condenser_api.get_block`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub previous: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub witness: String,
    #[serde(default)]
    pub block_id: String,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
    #[serde(default)]
    pub transaction_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub operations: Vec<Value>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_num: Option<u32>,
}

/// A pre-flattened operation as returned by `condenser_api.get_ops_in_block`.
///
/// Virtual operations carry `virtual_op > 0` and an empty or all-zero `trx_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationObject {
    #[serde(default)]
    pub trx_id: String,
    pub block: u64,
    #[serde(default)]
    pub trx_in_block: u32,
    #[serde(default)]
    pub op_in_trx: u32,
    #[serde(default)]
    pub virtual_op: u64,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub op: Value,
}

#[derive(Error, Debug, PartialEq)]
pub enum OperationDecodeError {
    #[error("operation is neither a [type, data] pair nor a {{type, value}} object")]
    UnknownShape,

    #[error("operation type is missing or not a string")]
    MissingType,

    #[error("payload of {0} is not an object")]
    PayloadNotObject(String),
}

/// Decode a raw operation into its normalized type tag and data map.
///
/// Accepts the condenser shape `["transfer", {...}]` and the appbase shape
/// `{"type": "transfer_operation", "value": {...}}`.
pub fn decode_operation(raw: &Value) -> Result<(String, Map<String, Value>), OperationDecodeError> {
    let (op_type, payload) = match raw {
        Value::Array(pair) if pair.len() == 2 => {
            let op_type = pair[0].as_str().ok_or(OperationDecodeError::MissingType)?;
            (op_type, &pair[1])
        }
        Value::Object(obj) => {
            let op_type = obj
                .get("type")
                .and_then(Value::as_str)
                .ok_or(OperationDecodeError::MissingType)?;
            let payload = obj.get("value").ok_or(OperationDecodeError::UnknownShape)?;
            (op_type, payload)
        }
        _ => return Err(OperationDecodeError::UnknownShape),
    };

    let op_type = normalize_op_type(op_type);
    match payload {
        Value::Object(data) => Ok((op_type, data.clone())),
        _ => Err(OperationDecodeError::PayloadNotObject(op_type)),
    }
}

/// Strip the `_operation` suffix appbase APIs append to type names.
pub fn normalize_op_type(op_type: &str) -> String {
    op_type
        .strip_suffix("_operation")
        .unwrap_or(op_type)
        .to_string()
}

/// Parse a chain timestamp (`2016-03-24T16:05:00`, implicitly UTC, or RFC 3339).
pub fn parse_chain_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Nodes report virtual operations with an empty or all-zero transaction id.
pub fn is_missing_trx_id(trx_id: &str) -> bool {
    trx_id.is_empty() || trx_id.bytes().all(|b| b == b'0')
}

pub fn virtual_trx_id(block_num: u64, virtual_op: u64) -> String {
    format!("virtual_{}_{}", block_num, virtual_op)
}

pub fn regular_trx_id(block_num: u64, trx_in_block: u32, op_in_trx: u32) -> String {
    format!("regular_{}_{}_{}", block_num, trx_in_block, op_in_trx)
}
