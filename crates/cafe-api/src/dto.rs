//! Data Transfer Objects for API requests and responses

use cafe_core::{asset, chain, DestAsset, Direction, Network, TxHash};
use renbridge::{AwaitingLabel, RelayFees, RevertPrompt, TransactionRecord, TxParams};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: Network,
}

impl HealthResponse {
    pub fn ok(network: Network) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            network,
        }
    }
}

/// Relay fees with the derived fractions the UI shows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeesResponse {
    pub fees: RelayFees,
    /// Fixed fee in BTC
    pub network_fee: f64,
    pub mint_rate: f64,
    pub burn_rate: f64,
}

impl From<RelayFees> for FeesResponse {
    fn from(fees: RelayFees) -> Self {
        Self {
            network_fee: fees.fixed_btc(),
            mint_rate: fees.dynamic_rate(Direction::Mint),
            burn_rate: fees.dynamic_rate(Direction::Burn),
            fees,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    /// Amount in source-asset units (BTC for mints, WBTC for burns)
    pub amount: f64,
    pub direction: Direction,
}

/// Query for the transaction list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Defaults to the configured network
    pub network: Option<Network>,
}

/// New BTC -> WBTC conversion
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMintRequest {
    pub amount: f64,
    /// Ethereum address receiving the swapped asset
    pub dest_address: String,
    pub local_web3_address: String,
    pub max_slippage: f64,
    pub min_exchange_rate: f64,
    #[serde(default)]
    pub min_swap_proceeds: f64,
    #[serde(default)]
    pub dest_asset: Option<DestAsset>,
    /// Gateway address, once generated
    #[serde(default)]
    pub gateway_address: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Server-assigned fields of a new record
#[derive(Debug, Clone)]
pub struct NewRecordMeta {
    pub id: String,
    pub network: Network,
    pub adapter_address: String,
    /// Unix milliseconds
    pub created_at: u64,
}

impl CreateMintRequest {
    pub fn into_record(self, meta: NewRecordMeta, nonce: String) -> TransactionRecord {
        let version = meta.network.as_str().to_string();
        TransactionRecord {
            id: meta.id,
            direction: Direction::Mint,
            source_asset: asset::BTC.to_string(),
            source_network: chain::BITCOIN.to_string(),
            source_network_version: version.clone(),
            dest_asset: self.dest_asset.unwrap_or(DestAsset::Wbtc).as_str().to_string(),
            dest_network: chain::ETHEREUM.to_string(),
            dest_network_version: version,
            dest_address: self.dest_address,
            amount: self.amount,
            ren_btc_address: self.gateway_address.unwrap_or_default(),
            local_web3_address: self.local_web3_address,
            params: TxParams {
                nonce: Some(self.nonce.unwrap_or(nonce)),
            },
            adapter_address: meta.adapter_address,
            max_slippage: self.max_slippage,
            min_swap_proceeds: self.min_swap_proceeds,
            min_exchange_rate: Some(self.min_exchange_rate),
            tx_created_at: Some(meta.created_at),
            ..empty_record()
        }
    }
}

/// New WBTC -> BTC conversion
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBurnRequest {
    pub amount: f64,
    /// Bitcoin address receiving the released BTC
    pub dest_address: String,
    pub local_web3_address: String,
    #[serde(default)]
    pub max_slippage: f64,
    pub min_swap_proceeds: f64,
}

impl CreateBurnRequest {
    pub fn into_record(self, meta: NewRecordMeta) -> TransactionRecord {
        let version = meta.network.as_str().to_string();
        TransactionRecord {
            id: meta.id,
            direction: Direction::Burn,
            source_asset: asset::WBTC.to_string(),
            source_network: chain::ETHEREUM.to_string(),
            source_network_version: version.clone(),
            dest_asset: asset::BTC.to_string(),
            dest_network: chain::BITCOIN.to_string(),
            dest_network_version: version,
            dest_address: self.dest_address,
            amount: self.amount,
            local_web3_address: self.local_web3_address,
            adapter_address: meta.adapter_address,
            max_slippage: self.max_slippage,
            min_swap_proceeds: self.min_swap_proceeds,
            tx_created_at: Some(meta.created_at),
            awaiting: AwaitingLabel::EthSettle,
            ..empty_record()
        }
    }
}

fn empty_record() -> TransactionRecord {
    TransactionRecord {
        id: String::new(),
        direction: Direction::Mint,
        source_asset: String::new(),
        source_network: String::new(),
        source_network_version: String::new(),
        dest_asset: String::new(),
        dest_network: String::new(),
        dest_network_version: String::new(),
        dest_address: String::new(),
        amount: 0.0,
        ren_btc_address: String::new(),
        local_web3_address: String::new(),
        source_tx_hash: None,
        source_amount: None,
        source_tx_confs: 0,
        source_tx_v_out: 0,
        dest_tx_hash: None,
        dest_tx_confs: 0,
        ren_signature: None,
        ren_response: None,
        params: TxParams::default(),
        adapter_address: String::new(),
        max_slippage: 0.0,
        min_swap_proceeds: 0.0,
        min_exchange_rate: None,
        exchange_rate_on_submit: None,
        tx_created_at: None,
        instant: false,
        awaiting: AwaitingLabel::BtcInit,
        error: false,
    }
}

/// Finalize a signed mint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMintRequest {
    /// Answer to an exchange-rate prompt, if the user gave one
    #[serde(default)]
    pub approve_swapped_asset: Option<DestAsset>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CompleteMintResponse {
    Submitted {
        record: TransactionRecord,
        hash: TxHash,
    },
    Halted {
        record: TransactionRecord,
        prompt: RevertPrompt,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct DestTxRequest {
    pub hash: String,
}

/// Outcome of polling a destination transaction
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub changed: bool,
    pub record: TransactionRecord,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}
