//! Pool quote source

use async_trait::async_trait;
use cafe_core::{RpcError, Sats};
use eth_rpc_client::abi::{self, AbiError, Token};
use eth_rpc_client::EthClient;
use num_bigint::BigUint;
use thiserror::Error;

use crate::constants::GET_DY_SIGNATURE;

/// Errors from pool quoting
#[derive(Debug, Error)]
pub enum CurveError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    #[error("Pool address not configured")]
    PoolNotConfigured,
}

/// Anything that can answer `get_dy` for a two-coin pool
#[async_trait]
pub trait PoolQuoter: Send + Sync {
    /// Output units of coin `j` for `dx` units of coin `i`
    async fn get_dy(&self, i: i128, j: i128, dx: Sats) -> Result<BigUint, CurveError>;
}

/// Curve pool contract read through `eth_call`
#[derive(Clone)]
pub struct CurvePool {
    client: EthClient,
    address: String,
}

impl CurvePool {
    pub fn new(client: EthClient, address: impl Into<String>) -> Result<Self, CurveError> {
        let address = address.into();
        if address.is_empty() {
            return Err(CurveError::PoolNotConfigured);
        }
        Ok(Self { client, address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Call data for `get_dy(i, j, dx)`
pub fn encode_get_dy(i: i128, j: i128, dx: Sats) -> Result<Vec<u8>, AbiError> {
    abi::encode_call(
        GET_DY_SIGNATURE,
        &[Token::Int(i), Token::Int(j), Token::Uint(BigUint::from(dx))],
    )
}

#[async_trait]
impl PoolQuoter for CurvePool {
    async fn get_dy(&self, i: i128, j: i128, dx: Sats) -> Result<BigUint, CurveError> {
        let data = encode_get_dy(i, j, dx)?;
        let output = self.client.call(&self.address, &data).await?;
        let dy = abi::decode_uint256(&output)?;
        tracing::debug!(pool = %self.address, i, j, dx, dy = %dy, "get_dy");
        Ok(dy)
    }
}
