use crate::blockchain::models::{OperationObject, RawBlock};
use crate::config::Config;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Block {0} is not available")]
    BlockNotFound(u64),

    #[error("Field missing from response: {0}")]
    MissingField(&'static str),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Read-only view of the chain the sync engine consumes.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn get_block(&self, block_num: u64) -> Result<RawBlock, ChainError>;

    /// Blocks `from..to_exclusive`, in ascending order, paired with their numbers.
    async fn get_blocks(
        &self,
        from: u64,
        to_exclusive: u64,
    ) -> Result<Vec<(u64, RawBlock)>, ChainError>;

    async fn get_latest_irreversible_block_number(&self) -> Result<u64, ChainError>;

    async fn get_ops_in_block(
        &self,
        block_num: u64,
        only_virtual: bool,
    ) -> Result<Vec<OperationObject>, ChainError>;
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
    #[serde(default)]
    id: Option<u64>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn into_result(self) -> Result<Value, ChainError> {
        if let Some(err) = self.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// JSON-RPC client for a Steem node.
pub struct SteemClient {
    http: reqwest::Client,
    api_url: String,
    next_id: AtomicU64,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl SteemClient {
    pub fn new(config: &Config) -> Result<Self, ChainError> {
        let api_url = config.steem.api_url.clone();
        let timeout = Duration::from_secs(config.steem.rpc_timeout_secs);

        info!("Initializing Steem client with RPC endpoint: {}, timeout: {:?}", api_url, timeout);

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        let limiter = config
            .steem
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_sec| RateLimiter::direct(Quota::per_second(per_sec)));

        Ok(Self {
            http,
            api_url,
            next_id: AtomicU64::new(1),
            limiter,
        })
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        self.throttle().await;

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response: RpcResponse = self
            .http
            .post(&self.api_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_result()
    }

    /// Send one JSON-RPC batch; results are returned in request order.
    async fn call_batch(&self, method: &str, params: Vec<Value>) -> Result<Vec<Value>, ChainError> {
        if params.is_empty() {
            return Ok(Vec::new());
        }
        self.throttle().await;

        let first_id = self.next_id.fetch_add(params.len() as u64, Ordering::Relaxed);
        let requests: Vec<RpcRequest> = params
            .into_iter()
            .enumerate()
            .map(|(i, params)| RpcRequest {
                jsonrpc: "2.0",
                method,
                params,
                id: first_id + i as u64,
            })
            .collect();
        let expected = requests.len();

        let responses: Vec<RpcResponse> = self
            .http
            .post(&self.api_url)
            .json(&requests)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // Batch responses may come back in any order.
        let mut by_id: HashMap<u64, RpcResponse> = HashMap::with_capacity(responses.len());
        for response in responses {
            let id = response
                .id
                .ok_or(ChainError::MissingField("id"))?;
            by_id.insert(id, response);
        }

        let mut results = Vec::with_capacity(expected);
        for i in 0..expected as u64 {
            let response = by_id.remove(&(first_id + i)).ok_or_else(|| {
                ChainError::UnexpectedResponse(format!("no response for request id {}", first_id + i))
            })?;
            results.push(response.into_result()?);
        }
        Ok(results)
    }
}

fn decode_block(block_num: u64, value: Value) -> Result<RawBlock, ChainError> {
    if value.is_null() {
        return Err(ChainError::BlockNotFound(block_num));
    }
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl ChainSource for SteemClient {
    async fn get_block(&self, block_num: u64) -> Result<RawBlock, ChainError> {
        let result = self.call("condenser_api.get_block", json!([block_num])).await?;
        decode_block(block_num, result)
    }

    async fn get_blocks(
        &self,
        from: u64,
        to_exclusive: u64,
    ) -> Result<Vec<(u64, RawBlock)>, ChainError> {
        debug!("Fetching blocks {}..{}", from, to_exclusive);

        let numbers: Vec<u64> = (from..to_exclusive).collect();
        let params = numbers.iter().map(|n| json!([n])).collect();
        let results = self.call_batch("condenser_api.get_block", params).await?;

        numbers
            .into_iter()
            .zip(results)
            .map(|(n, value)| decode_block(n, value).map(|block| (n, block)))
            .collect()
    }

    async fn get_latest_irreversible_block_number(&self) -> Result<u64, ChainError> {
        let props = self
            .call("condenser_api.get_dynamic_global_properties", json!([]))
            .await?;

        props
            .get("last_irreversible_block_num")
            .and_then(Value::as_u64)
            .ok_or(ChainError::MissingField("last_irreversible_block_num"))
    }

    async fn get_ops_in_block(
        &self,
        block_num: u64,
        only_virtual: bool,
    ) -> Result<Vec<OperationObject>, ChainError> {
        let result = self
            .call("condenser_api.get_ops_in_block", json!([block_num, only_virtual]))
            .await?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(result)?)
    }
}
