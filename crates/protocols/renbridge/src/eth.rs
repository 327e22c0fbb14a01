//! Ethereum side of the lifecycle: lookups and contract submission

use async_trait::async_trait;
use cafe_core::{RpcError, TxHash};
use eth_rpc_client::{EthClient, TxDetails, TxReceipt, TxRequest};

/// Read access to the mint chain
#[async_trait]
pub trait EthChain: Send + Sync {
    async fn get_transaction(&self, hash: &TxHash) -> Result<Option<TxDetails>, RpcError>;

    async fn get_transaction_receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, RpcError>;

    /// Blocks mined on top of the transaction's block (0 while pending)
    async fn confirmations(&self, details: &TxDetails) -> Result<u64, RpcError>;
}

#[async_trait]
impl EthChain for EthClient {
    async fn get_transaction(&self, hash: &TxHash) -> Result<Option<TxDetails>, RpcError> {
        EthClient::get_transaction(self, hash).await
    }

    async fn get_transaction_receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, RpcError> {
        EthClient::get_transaction_receipt(self, hash).await
    }

    async fn confirmations(&self, details: &TxDetails) -> Result<u64, RpcError> {
        EthClient::confirmations(self, details).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Gas estimation failed: {0}")]
    Gas(RpcError),

    #[error("Submission failed: {0}")]
    Send(RpcError),
}

/// Sends adapter calls from the user's account
#[async_trait]
pub trait ContractSubmitter: Send + Sync {
    /// Submit `data` to `to` from `from`, returning the transaction hash
    async fn submit(&self, from: &str, to: &str, data: Vec<u8>) -> Result<TxHash, SubmitError>;
}

/// Submits through a node-managed account with explicit gas parameters
#[derive(Clone)]
pub struct EthSubmitter {
    client: EthClient,
}

impl EthSubmitter {
    pub fn new(client: EthClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContractSubmitter for EthSubmitter {
    async fn submit(&self, from: &str, to: &str, data: Vec<u8>) -> Result<TxHash, SubmitError> {
        let gas = self
            .client
            .gas_params(from, to, &data)
            .await
            .map_err(SubmitError::Gas)?;
        tracing::debug!(from, to, gas = gas.gas, nonce = gas.nonce, "Submitting adapter call");

        let tx = TxRequest {
            from: from.to_string(),
            to: to.to_string(),
            data,
            gas: Some(gas),
        };
        self.client.send_transaction(&tx).await.map_err(SubmitError::Send)
    }
}
