//! Application state shared across API handlers
//!
//! Every service the handlers need is built once at startup and passed in;
//! nothing is held in globals.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cafe_core::{AppConfig, Error, Network};
use curve::{CurvePool, PoolQuoter};
use eth_rpc_client::EthClient;
use renbridge::{
    ContractSubmitter, EthChain, EthSubmitter, FeeStore, LightnodeFeeSource, MemoryStore,
    RelayFeeSource, RevertPrompt, TransactionLifecycle, TransactionStore,
};
use tokio::sync::RwLock;

/// Boundary implementations the state is assembled from
pub struct Services {
    pub store: Arc<dyn TransactionStore>,
    pub fee_source: Arc<dyn RelayFeeSource>,
    pub pool: Arc<dyn PoolQuoter>,
    pub chain: Arc<dyn EthChain>,
    pub submitter: Arc<dyn ContractSubmitter>,
}

impl Services {
    /// JSON-RPC backed services for a configuration (no network access yet)
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let client = EthClient::new(&config.eth)?;
        let pool = CurvePool::new(client.clone(), config.contracts().curve_pool.clone()).map_err(
            |e| Error::Config(format!("curve pool for {}: {}", config.network, e)),
        )?;
        let fee_source = LightnodeFeeSource::new(
            config.relay_url(),
            Duration::from_secs(config.eth.timeout_secs),
        );

        Ok(Self {
            store: Arc::new(MemoryStore::new()),
            fee_source: Arc::new(fee_source),
            pool: Arc::new(pool),
            chain: Arc::new(client.clone()),
            submitter: Arc::new(EthSubmitter::new(client)),
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    fees: Arc<FeeStore>,
    pool: Arc<dyn PoolQuoter>,
    lifecycle: TransactionLifecycle,
    /// Outstanding exchange-rate prompts by transaction id
    prompts: RwLock<HashMap<String, RevertPrompt>>,
}

impl AppState {
    /// State backed by the configured RPC endpoints
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let services = Services::from_config(&config)?;
        Ok(Self::with_services(config, services))
    }

    pub fn with_services(config: AppConfig, services: Services) -> Self {
        let fees = Arc::new(FeeStore::new(services.fee_source));
        let lifecycle = TransactionLifecycle::new(
            services.store,
            fees.clone(),
            services.pool.clone(),
            services.chain,
            services.submitter,
        );

        tracing::info!(network = %config.network, eth = %config.eth.url, "Application state ready");
        Self {
            inner: Arc::new(AppStateInner {
                config,
                fees,
                pool: services.pool,
                lifecycle,
                prompts: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn network(&self) -> Network {
        self.inner.config.network
    }

    pub fn fees(&self) -> &FeeStore {
        &self.inner.fees
    }

    pub fn pool(&self) -> &dyn PoolQuoter {
        self.inner.pool.as_ref()
    }

    pub fn lifecycle(&self) -> &TransactionLifecycle {
        &self.inner.lifecycle
    }

    pub fn store(&self) -> &dyn TransactionStore {
        self.inner.lifecycle.store().as_ref()
    }

    pub async fn set_prompt(&self, prompt: RevertPrompt) {
        self.inner
            .prompts
            .write()
            .await
            .insert(prompt.tx_id.clone(), prompt);
    }

    /// Remove the prompt for a transaction once the user has answered it
    pub async fn clear_prompt(&self, tx_id: &str) -> Option<RevertPrompt> {
        self.inner.prompts.write().await.remove(tx_id)
    }

    pub async fn prompts(&self) -> Vec<RevertPrompt> {
        let mut prompts: Vec<_> = self.inner.prompts.read().await.values().cloned().collect();
        prompts.sort_by(|a, b| a.tx_id.cmp(&b.tx_id));
        prompts
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use cafe_core::{RpcError, Sats, TxHash};
    use curve::CurveError;
    use eth_rpc_client::{TxDetails, TxReceipt};
    use num_bigint::BigUint;
    use renbridge::{FeeError, RelayFees, SubmitError};

    use super::*;

    pub struct FixedPool(pub f64);

    #[async_trait]
    impl PoolQuoter for FixedPool {
        async fn get_dy(&self, _: i128, _: i128, dx: Sats) -> Result<BigUint, CurveError> {
            Ok(BigUint::from((dx as f64 * self.0).round() as u64))
        }
    }

    pub struct StaticFees;

    #[async_trait]
    impl RelayFeeSource for StaticFees {
        async fn get_fees(&self) -> Result<RelayFees, FeeError> {
            Ok(RelayFees {
                lock: 35_000,
                release: 35_000,
                mint_bps: 25,
                burn_bps: 10,
            })
        }
    }

    pub struct NoChain;

    #[async_trait]
    impl EthChain for NoChain {
        async fn get_transaction(&self, _: &TxHash) -> Result<Option<TxDetails>, RpcError> {
            Ok(None)
        }

        async fn get_transaction_receipt(&self, _: &TxHash) -> Result<Option<TxReceipt>, RpcError> {
            Ok(None)
        }

        async fn confirmations(&self, _: &TxDetails) -> Result<u64, RpcError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    pub struct RecordingSubmitter {
        pub calls: Mutex<usize>,
        pub fail: Mutex<bool>,
    }

    #[async_trait]
    impl ContractSubmitter for RecordingSubmitter {
        async fn submit(&self, _: &str, _: &str, _: Vec<u8>) -> Result<TxHash, SubmitError> {
            *self.calls.lock().unwrap() += 1;
            if *self.fail.lock().unwrap() {
                return Err(SubmitError::Send(RpcError::Timeout { secs: 1 }));
            }
            Ok(TxHash::new("0xfeed"))
        }
    }

    /// State on testnet with a 0.99 pool and in-memory store
    pub fn test_state() -> AppState {
        test_state_with_submitter().0
    }

    pub fn test_state_with_submitter() -> (AppState, Arc<RecordingSubmitter>) {
        let config = AppConfig {
            network: Network::Testnet,
            ..AppConfig::default()
        };
        let submitter = Arc::new(RecordingSubmitter::default());
        let state = AppState::with_services(
            config,
            Services {
                store: Arc::new(MemoryStore::new()),
                fee_source: Arc::new(StaticFees),
                pool: Arc::new(FixedPool(0.99)),
                chain: Arc::new(NoChain),
                submitter: submitter.clone(),
            },
        );
        (state, submitter)
    }
}
