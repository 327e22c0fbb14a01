//! JSON-RPC response and request shapes

use cafe_core::{BlockHeight, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::abi;

/// Subset of `eth_getTransactionByHash`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDetails {
    pub hash: String,
    /// Hex quantity, `null` while pending
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl TxDetails {
    pub fn block_number(&self) -> Result<Option<BlockHeight>, RpcError> {
        self.block_number.as_deref().map(parse_quantity).transpose()
    }
}

/// Subset of `eth_getTransactionReceipt`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    /// `0x1` on success, `0x0` when the transaction reverted
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
}

impl TxReceipt {
    /// A receipt reverted when its status quantity is zero
    pub fn reverted(&self) -> bool {
        matches!(self.status.as_deref().map(parse_quantity), Some(Ok(0)))
    }
}

/// Gas settings for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasParams {
    pub gas: u64,
    pub gas_price: u128,
    pub nonce: u64,
}

/// Transaction to submit through `eth_sendTransaction`
#[derive(Debug, Clone)]
pub struct TxRequest {
    pub from: String,
    pub to: String,
    pub data: Vec<u8>,
    pub gas: Option<GasParams>,
}

impl TxRequest {
    pub fn to_json(&self) -> Value {
        let mut tx = json!({
            "from": self.from,
            "to": self.to,
            "data": abi::to_hex_data(&self.data),
        });
        if let Some(gas) = &self.gas {
            tx["gas"] = json!(format!("0x{:x}", gas.gas));
            tx["gasPrice"] = json!(format!("0x{:x}", gas.gas_price));
            tx["nonce"] = json!(format!("0x{:x}", gas.nonce));
        }
        tx
    }
}

/// Parse a hex quantity (`0x1a`) as u64
pub fn parse_quantity(value: &str) -> Result<u64, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::ParseError(format!("quantity {}: {}", value, e)))
}

/// Parse a hex quantity (`0x1a`) as u128
pub fn parse_quantity_u128(value: &str) -> Result<u128, RpcError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| RpcError::ParseError(format!("quantity {}: {}", value, e)))
}
