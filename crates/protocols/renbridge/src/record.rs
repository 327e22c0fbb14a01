//! Persisted transaction record
//!
//! The flat shape stored per conversion and listed in the transactions table.
//! `awaiting` and `error` are recomputed from machine state on every
//! observation; everything else is owned by the store.

use cafe_core::{Direction, Network, Sats};
use serde::{Deserialize, Serialize};

use crate::status::AwaitingLabel;

/// Relay network's answer for a deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Amount minted after the relay's fixed fee, in satoshis
    pub amount: Sats,
    /// Hash identifying the deposit to the mint contract (hex)
    pub nhash: String,
    /// Set when the relay refused the deposit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert: Option<String>,
    /// The deposit the user actually sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utxo: Option<RelayUtxo>,
}

impl RelayResponse {
    pub fn is_reverted(&self) -> bool {
        self.revert.as_deref().is_some_and(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayUtxo {
    /// Deposited amount in satoshis
    pub amount: Sats,
    pub tx_hash: String,
    #[serde(default)]
    pub v_out: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// A persisted BTC <-> WBTC conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub source_asset: String,
    pub source_network: String,
    pub source_network_version: String,
    pub dest_asset: String,
    pub dest_network: String,
    pub dest_network_version: String,
    pub dest_address: String,
    /// Target amount in source-asset units
    pub amount: f64,
    /// Gateway (deposit) address
    #[serde(default)]
    pub ren_btc_address: String,
    #[serde(default)]
    pub local_web3_address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<f64>,
    #[serde(default)]
    pub source_tx_confs: u64,
    #[serde(default)]
    pub source_tx_v_out: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_tx_hash: Option<String>,
    #[serde(default)]
    pub dest_tx_confs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ren_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ren_response: Option<RelayResponse>,

    #[serde(default)]
    pub params: TxParams,
    #[serde(default)]
    pub adapter_address: String,
    #[serde(default)]
    pub max_slippage: f64,
    #[serde(default)]
    pub min_swap_proceeds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_exchange_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate_on_submit: Option<f64>,
    /// Creation time, unix milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_created_at: Option<u64>,
    #[serde(default)]
    pub instant: bool,

    #[serde(default)]
    pub awaiting: AwaitingLabel,
    #[serde(default)]
    pub error: bool,
}

impl TransactionRecord {
    /// Network version of the conversion, normalized
    pub fn network(&self) -> Network {
        Network::from_version(&self.source_network_version)
    }

    pub fn has_dest_tx(&self) -> bool {
        self.dest_tx_hash.as_deref().is_some_and(|h| !h.is_empty())
    }

    /// Copy fields that only exist on the persisted record (the session has
    /// no slot for them) from an earlier version of the same record.
    pub fn carry_record_fields(&mut self, stored: &TransactionRecord) {
        self.exchange_rate_on_submit = stored.exchange_rate_on_submit;
        self.tx_created_at = stored.tx_created_at;
        self.instant = stored.instant;
    }
}
