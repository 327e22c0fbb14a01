//! Gateway session: the context a relay state machine runs on

use cafe_core::{DestAsset, Direction, Network};
use serde::{Deserialize, Serialize};

use crate::constants::{target_confs, SettlementChain};
use crate::record::{RelayResponse, TxParams};

/// Parameters the adapter contract needs besides the session basics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomParams {
    pub adapter_address: String,
    pub max_slippage: f64,
    pub min_swap_proceeds: f64,
    pub min_exchange_rate: Option<f64>,
    pub dest_asset: DestAsset,
    pub params: TxParams,
}

/// One observed deposit (mint) or burn (release) for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayDeposit {
    pub source_tx_hash: String,
    pub source_tx_amount: Option<f64>,
    pub source_tx_confs: u64,
    pub source_tx_conf_target: u64,
    pub source_tx_v_out: u32,
    pub dest_tx_hash: Option<String>,
    pub dest_tx_confs: u64,
    pub dest_tx_conf_target: u64,
    pub ren_response: Option<RelayResponse>,
    pub ren_signature: Option<String>,
}

impl GatewayDeposit {
    /// A freshly observed deposit with confirmation targets for its chains
    pub fn observed(source_tx_hash: impl Into<String>, direction: Direction, network: Network) -> Self {
        let (source, dest) = match direction {
            Direction::Mint => (SettlementChain::Bitcoin, SettlementChain::Ethereum),
            Direction::Burn => (SettlementChain::Ethereum, SettlementChain::Bitcoin),
        };
        Self {
            source_tx_hash: source_tx_hash.into(),
            source_tx_amount: None,
            source_tx_confs: 0,
            source_tx_conf_target: target_confs(network, source),
            source_tx_v_out: 0,
            dest_tx_hash: None,
            dest_tx_confs: 0,
            dest_tx_conf_target: target_confs(network, dest),
            ren_response: None,
            ren_signature: None,
        }
    }
}

/// Nested session context for one conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySession {
    pub id: String,
    pub direction: Direction,
    pub network: Network,
    pub source_asset: String,
    pub source_chain: String,
    pub dest_address: String,
    pub dest_chain: String,
    pub target_amount: f64,
    pub user_address: String,
    pub gateway_address: String,
    /// Unix milliseconds; `None` never expires
    pub expiry_time: Option<u64>,
    pub nonce: Option<String>,
    pub custom_params: CustomParams,
    /// Deposits in the order they were first observed
    pub transactions: Vec<GatewayDeposit>,
}

impl GatewaySession {
    /// The deposit that drives the row: the first one observed
    pub fn active_deposit(&self) -> Option<&GatewayDeposit> {
        self.transactions.first()
    }

    /// Record a deposit, ignoring hashes already known
    pub fn observe_deposit(&mut self, deposit: GatewayDeposit) {
        if !self
            .transactions
            .iter()
            .any(|d| d.source_tx_hash == deposit.source_tx_hash)
        {
            self.transactions.push(deposit);
        }
    }
}
