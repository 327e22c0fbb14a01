//! Configuration types for wbtc.cafe

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Network};

/// Environment variable naming a JSON config file
pub const CONFIG_PATH_ENV: &str = "CAFE_CONFIG";
/// Environment override for the Ethereum RPC URL
pub const ETH_RPC_URL_ENV: &str = "CAFE_ETH_RPC_URL";
/// Environment override for the network version
pub const NETWORK_ENV: &str = "CAFE_NETWORK";

/// Ethereum JSON-RPC connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthConfig {
    /// RPC URL (e.g., "http://127.0.0.1:8545")
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EthConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Relay network endpoints (lightnode JSON-RPC), one per network version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub mainnet_url: String,
    pub testnet_url: String,
}

impl RelayConfig {
    pub fn url_for(&self, network: Network) -> &str {
        match network {
            Network::Mainnet => &self.mainnet_url,
            Network::Testnet => &self.testnet_url,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mainnet_url: "https://lightnode-mainnet.herokuapp.com".to_string(),
            testnet_url: "https://lightnode-testnet.herokuapp.com".to_string(),
        }
    }
}

/// Contract addresses on the mint chain for one network version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Curve pool used for `get_dy` quotes
    #[serde(default)]
    pub curve_pool: String,

    /// Adapter contract exposing `mintThenSwap` / `swapThenBurn`
    #[serde(default)]
    pub adapter: String,
}

/// Contract addresses for both network versions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub mainnet: ContractAddresses,
    #[serde(default)]
    pub testnet: ContractAddresses,
}

impl ContractsConfig {
    pub fn for_network(&self, network: Network) -> &ContractAddresses {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Testnet => &self.testnet,
        }
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            mainnet: ContractAddresses {
                // Curve renBTC/WBTC pool
                curve_pool: "0x93054188d876f558f4a66B2EF1d97d16eDf0895B".to_string(),
                adapter: String::new(),
            },
            testnet: ContractAddresses::default(),
        }
    }
}

/// Destination-chain watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// How often pending destination transactions are polled (seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ethereum RPC settings
    #[serde(default)]
    pub eth: EthConfig,

    /// Relay network settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// Network (mainnet or testnet)
    pub network: Network,

    /// Contract addresses per network
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default)]
    pub watcher: WatcherConfig,
}

fn default_api_port() -> u16 {
    18545
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            eth: EthConfig::default(),
            relay: RelayConfig::default(),
            network: Network::Mainnet,
            contracts: ContractsConfig::default(),
            api_port: default_api_port(),
            watcher: WatcherConfig::default(),
        }
    }
}

impl AppConfig {
    /// Contract addresses for the configured network
    pub fn contracts(&self) -> &ContractAddresses {
        self.contracts.for_network(self.network)
    }

    /// Relay endpoint for the configured network
    pub fn relay_url(&self) -> &str {
        self.relay.url_for(self.network)
    }

    /// Parse a config from JSON text
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Load from `CAFE_CONFIG` if set (defaults otherwise), then apply
    /// `CAFE_ETH_RPC_URL` and `CAFE_NETWORK` overrides.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(
            std::env::var(ETH_RPC_URL_ENV).ok(),
            std::env::var(NETWORK_ENV).ok(),
        );
        Ok(config)
    }

    fn apply_overrides(&mut self, eth_url: Option<String>, network: Option<String>) {
        if let Some(url) = eth_url.filter(|u| !u.is_empty()) {
            tracing::debug!(%url, "Overriding Ethereum RPC URL from environment");
            self.eth.url = url;
        }
        if let Some(version) = network {
            self.network = Network::from_version(&version);
        }
    }
}
