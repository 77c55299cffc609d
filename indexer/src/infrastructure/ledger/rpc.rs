//! JSON-RPC ledger head provider

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{LedgerError, LedgerHead};
use crate::config::AppConfig;

/// Ledger head backed by the node's JSON-RPC interface
#[derive(Debug)]
pub struct RpcLedgerHead {
    endpoint: String,
    client: Client,
}

impl RpcLedgerHead {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.ledger.rpc_url.clone())
    }

    /// Make a JSON-RPC call and return its `result`
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        let response_json: Value = self
            .client
            .post(&self.endpoint)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LedgerError::NetworkError(e.to_string()))?
            .json()
            .await
            .map_err(|e| LedgerError::ParseError(e.to_string()))?;

        if let Some(error) = response_json.get("error").filter(|e| !e.is_null()) {
            return Err(LedgerError::NetworkError(error.to_string()));
        }

        response_json
            .get("result")
            .cloned()
            .ok_or_else(|| LedgerError::ParseError("No result in response".to_string()))
    }
}

#[async_trait]
impl LedgerHead for RpcLedgerHead {
    async fn get_best_block_number(&self) -> Result<i64, LedgerError> {
        let result = self.rpc_call("chain_getBestBlockNumber", json!([])).await?;
        result
            .as_i64()
            .ok_or_else(|| LedgerError::ParseError("Invalid best block number".to_string()))
    }

    async fn get_block_timestamp(&self, block_number: i64) -> Result<i64, LedgerError> {
        let block = self
            .rpc_call("chain_getBlockByNumber", json!([block_number]))
            .await?;
        if block.is_null() {
            return Err(LedgerError::BlockNotFound(block_number));
        }
        block
            .get("timestamp")
            .and_then(Value::as_i64)
            .ok_or_else(|| LedgerError::ParseError("Block without timestamp".to_string()))
    }
}
