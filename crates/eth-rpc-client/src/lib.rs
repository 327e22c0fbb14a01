//! eth-rpc-client: Ethereum JSON-RPC client for the mint chain
//!
//! Wraps a `reqwest` client with request timeouts and typed accessors for the
//! handful of calls the bridge needs: transaction and receipt lookup, block
//! height, read-only `eth_call`, gas parameters and transaction submission.

pub mod abi;
pub mod types;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cafe_core::{BlockHeight, EthConfig, RpcError, TxHash};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

pub use types::{GasParams, TxDetails, TxReceipt, TxRequest};

/// Extra gas added on top of the node's estimate
pub const GAS_ESTIMATE_BUFFER: u64 = 1000;

/// Result type for RPC client operations
pub type Result<T> = std::result::Result<T, RpcError>;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Ethereum JSON-RPC client
#[derive(Clone)]
pub struct EthClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    next_id: Arc<AtomicU64>,
}

impl EthClient {
    /// Create a client for the configured endpoint (no network access)
    pub fn new(config: &EthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("wbtc-cafe")
            .build()
            .map_err(|e| RpcError::Unreachable {
                url: format!("{}: {}", config.url, e),
            })?;

        Ok(Self {
            http,
            url: config.url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current block height
    pub async fn block_number(&self) -> Result<BlockHeight> {
        let value: String = self.request("eth_blockNumber", json!([])).await?;
        types::parse_quantity(&value)
    }

    /// Transaction details, `None` when the node does not know the hash
    pub async fn get_transaction(&self, hash: &TxHash) -> Result<Option<TxDetails>> {
        self.request("eth_getTransactionByHash", json!([hash.as_str()]))
            .await
    }

    /// Transaction receipt, `None` while the transaction is pending
    pub async fn get_transaction_receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash.as_str()]))
            .await
    }

    /// Confirmations of a transaction relative to the current block.
    ///
    /// Pending transactions (no block yet) and blocks ahead of the node's
    /// view count as zero.
    pub async fn confirmations(&self, details: &TxDetails) -> Result<u64> {
        let current = self.block_number().await?;
        Ok(match details.block_number()? {
            Some(block) if block <= current => current - block,
            _ => 0,
        })
    }

    /// Read-only contract call at the latest block
    pub async fn call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>> {
        let params = json!([{ "to": to, "data": abi::to_hex_data(data) }, "latest"]);
        let value: String = self.request("eth_call", params).await?;
        abi::parse_hex_bytes(&value).map_err(|e| RpcError::ParseError(e.to_string()))
    }

    pub async fn estimate_gas(&self, from: &str, to: &str, data: &[u8]) -> Result<u64> {
        let params = json!([{ "from": from, "to": to, "data": abi::to_hex_data(data) }]);
        let value: String = self.request("eth_estimateGas", params).await?;
        types::parse_quantity(&value)
    }

    pub async fn gas_price(&self) -> Result<u128> {
        let value: String = self.request("eth_gasPrice", json!([])).await?;
        types::parse_quantity_u128(&value)
    }

    /// Pending nonce of an account
    pub async fn transaction_count(&self, from: &str) -> Result<u64> {
        let value: String = self
            .request("eth_getTransactionCount", json!([from, "pending"]))
            .await?;
        types::parse_quantity(&value)
    }

    /// Gas limit (estimate plus buffer), gas price and nonce for a call
    pub async fn gas_params(&self, from: &str, to: &str, data: &[u8]) -> Result<GasParams> {
        let gas = self.estimate_gas(from, to, data).await? + GAS_ESTIMATE_BUFFER;
        let gas_price = self.gas_price().await?;
        let nonce = self.transaction_count(from).await?;
        Ok(GasParams {
            gas,
            gas_price,
            nonce,
        })
    }

    /// Submit a transaction signed by the node-managed account
    pub async fn send_transaction(&self, tx: &TxRequest) -> Result<TxHash> {
        let hash: String = self
            .request("eth_sendTransaction", json!([tx.to_json()]))
            .await?;
        tracing::info!(%hash, to = %tx.to, "Submitted transaction");
        Ok(TxHash::new(hash))
    }

    /// Submit an already-signed raw transaction
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash> {
        let hash: String = self
            .request("eth_sendRawTransaction", json!([abi::to_hex_data(raw)]))
            .await?;
        Ok(TxHash::new(hash))
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::trace!(method, id, "eth rpc request");

        let send = async {
            self.http
                .post(&self.url)
                .json(&body)
                .send()
                .await?
                .json::<RpcResponse>()
                .await
        };
        let response = timed_request(self.timeout, send).await?;

        if let Some(err) = response.error {
            return Err(classify_rpc_error(err));
        }

        serde_json::from_value(response.result)
            .map_err(|e| RpcError::ParseError(format!("{}: {}", method, e)))
    }
}

fn classify_rpc_error(err: RpcErrorObject) -> RpcError {
    // Geth reports reverts as code 3, other nodes only in the message
    if err.code == 3 || err.message.contains("revert") {
        RpcError::CallReverted {
            reason: err.message,
        }
    } else {
        RpcError::ApiError {
            message: format!("{} (code {})", err.message, err.code),
        }
    }
}

/// Bound a request future by a timeout, mapping both failure modes to `RpcError`
pub async fn timed_request<T, E: std::fmt::Display>(
    timeout: Duration,
    fut: impl std::future::Future<Output = std::result::Result<T, E>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| RpcError::Timeout {
            secs: timeout.as_secs(),
        })?
        .map_err(|e| RpcError::ApiError {
            message: e.to_string(),
        })
}
