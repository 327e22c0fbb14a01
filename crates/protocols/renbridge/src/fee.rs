//! Relay fees and the fee cache
//!
//! The relay charges a fixed fee per lock/release (satoshis) and a dynamic
//! rate per mint/burn (basis points, divisor 10000). Fees are fetched on
//! first use and kept until `refresh()` is called; there is no timed expiry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cafe_core::constants::{BPS_DIVISOR, SATS_PER_BTC};
use cafe_core::{Direction, RpcError, Sats};
use eth_rpc_client::timed_request;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::constants::QUERY_FEES_METHOD;

/// Fees charged by the relay network for BTC on Ethereum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayFees {
    /// Fixed fee for locking BTC, in satoshis
    pub lock: Sats,
    /// Fixed fee for releasing BTC, in satoshis
    pub release: Sats,
    /// Dynamic mint rate in basis points
    pub mint_bps: u32,
    /// Dynamic burn rate in basis points
    pub burn_bps: u32,
}

impl RelayFees {
    /// Fixed deduction in BTC. The lock fee is the one the relay quotes for
    /// both directions of the swap.
    pub fn fixed_btc(&self) -> f64 {
        self.lock as f64 / SATS_PER_BTC as f64
    }

    /// Dynamic fee as a fraction for a direction
    pub fn dynamic_rate(&self, direction: Direction) -> f64 {
        let bps = match direction {
            Direction::Mint => self.mint_bps,
            Direction::Burn => self.burn_bps,
        };
        bps as f64 / BPS_DIVISOR
    }
}

/// Errors from fee fetching
#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Relay returned error: {message}")]
    Relay { message: String },

    #[error("Fee response missing field: {field}")]
    MissingField { field: &'static str },
}

/// Anything that can report the relay's current fees
#[async_trait]
pub trait RelayFeeSource: Send + Sync {
    async fn get_fees(&self) -> Result<RelayFees, FeeError>;
}

/// Fee source backed by a relay lightnode's JSON-RPC endpoint
#[derive(Clone)]
pub struct LightnodeFeeSource {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl LightnodeFeeSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Deserialize)]
struct QueryFeesResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AssetFees {
    #[serde(deserialize_with = "de_amount")]
    lock: u64,
    #[serde(deserialize_with = "de_amount")]
    release: u64,
    ethereum: MintChainFees,
}

#[derive(Debug, Deserialize)]
struct MintChainFees {
    #[serde(deserialize_with = "de_amount")]
    mint: u64,
    #[serde(deserialize_with = "de_amount")]
    burn: u64,
}

/// Lightnodes encode amounts either as numbers or as decimal strings
fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("not an unsigned amount: {}", n))),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("unexpected amount: {}", other))),
    }
}

/// Extract BTC-on-Ethereum fees from a `ren_queryFees` result
pub fn parse_fees(result: &Value) -> Result<RelayFees, FeeError> {
    let btc = result
        .get("btc")
        .ok_or(FeeError::MissingField { field: "btc" })?;
    let fees: AssetFees = serde_json::from_value(btc.clone())
        .map_err(|e| RpcError::ParseError(format!("{}: {}", QUERY_FEES_METHOD, e)))?;

    Ok(RelayFees {
        lock: fees.lock,
        release: fees.release,
        mint_bps: u32::try_from(fees.ethereum.mint)
            .map_err(|_| FeeError::MissingField { field: "ethereum.mint" })?,
        burn_bps: u32::try_from(fees.ethereum.burn)
            .map_err(|_| FeeError::MissingField { field: "ethereum.burn" })?,
    })
}

#[async_trait]
impl RelayFeeSource for LightnodeFeeSource {
    async fn get_fees(&self) -> Result<RelayFees, FeeError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": QUERY_FEES_METHOD,
            "params": {},
        });

        let send = async {
            self.http
                .post(&self.url)
                .json(&body)
                .send()
                .await?
                .json::<QueryFeesResponse>()
                .await
        };
        let response = timed_request(self.timeout, send).await?;

        if let Some(err) = response.error {
            return Err(FeeError::Relay {
                message: err.to_string(),
            });
        }
        let result = response
            .result
            .ok_or(FeeError::MissingField { field: "result" })?;
        let fees = parse_fees(&result)?;
        tracing::debug!(url = %self.url, ?fees, "Fetched relay fees");
        Ok(fees)
    }
}

/// Lazily filled cache of relay fees
pub struct FeeStore {
    source: Arc<dyn RelayFeeSource>,
    cached: RwLock<Option<RelayFees>>,
}

impl FeeStore {
    pub fn new(source: Arc<dyn RelayFeeSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Cached fees, fetching them on first use
    pub async fn fees(&self) -> Result<RelayFees, FeeError> {
        if let Some(fees) = *self.cached.read().await {
            return Ok(fees);
        }
        self.refresh().await
    }

    /// Fetch fresh fees and replace the cached value
    pub async fn refresh(&self) -> Result<RelayFees, FeeError> {
        let fees = self.source.get_fees().await.map_err(|e| {
            tracing::warn!(error = %e, error_hint = "fee fetch", "Failed to fetch relay fees");
            e
        })?;
        *self.cached.write().await = Some(fees);
        Ok(fees)
    }

    /// Whatever is cached right now, without fetching
    pub async fn cached(&self) -> Option<RelayFees> {
        *self.cached.read().await
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_parse_fees_mixed_encodings() {
        let result = json!({
            "btc": {
                "lock": "35000",
                "release": 35000,
                "ethereum": { "mint": 25, "burn": "10" }
            }
        });
        let fees = parse_fees(&result).unwrap();
        assert_eq!(fees, testnet_fees());
    }

    #[test]
    fn test_parse_fees_missing_asset() {
        let err = parse_fees(&json!({ "zec": {} })).unwrap_err();
        assert!(matches!(err, FeeError::MissingField { field: "btc" }));
    }

    #[test]
    fn test_rates() {
        let fees = testnet_fees();
        assert_eq!(fees.fixed_btc(), 0.00035);
        assert_eq!(fees.dynamic_rate(Direction::Mint), 0.0025);
        assert_eq!(fees.dynamic_rate(Direction::Burn), 0.001);
    }

    #[tokio::test]
    async fn test_store_fetches_once_until_refresh() {
        let source = Arc::new(CountingFeeSource::default());
        let store = FeeStore::new(source.clone());
        assert_eq!(store.cached().await, None);

        store.fees().await.unwrap();
        store.fees().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        store.refresh().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.cached().await, Some(testnet_fees()));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_cache_empty() {
        let source = Arc::new(CountingFeeSource {
            fail: true,
            ..Default::default()
        });
        let store = FeeStore::new(source);
        assert!(store.fees().await.is_err());
        assert_eq!(store.cached().await, None);
    }
}
