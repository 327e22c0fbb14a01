//! Conversion between persisted records and machine sessions
//!
//! The two shapes agree on every field they share. Deposit sub-records do not
//! survive persistence: only the active deposit's fields are flattened into
//! the record, and a restored session starts with no known deposits.

use cafe_core::{DestAsset, Direction, Network};

use crate::record::{TransactionRecord, TxParams};
use crate::session::{CustomParams, GatewaySession};
use crate::status::AwaitingLabel;

/// Build the machine context for a stored record.
///
/// Direction is re-derived from the source asset, so a record whose `type`
/// disagrees with its asset restores as the asset says.
pub fn to_session(record: &TransactionRecord) -> GatewaySession {
    GatewaySession {
        id: record.id.clone(),
        direction: Direction::from_source_asset(&record.source_asset),
        network: Network::from_version(&record.source_network_version),
        source_asset: record.source_asset.clone(),
        source_chain: record.source_network.clone(),
        dest_address: record.dest_address.clone(),
        dest_chain: record.dest_network.clone(),
        target_amount: record.amount,
        user_address: record.local_web3_address.clone(),
        gateway_address: record.ren_btc_address.clone(),
        expiry_time: None,
        nonce: record.params.nonce.clone(),
        custom_params: CustomParams {
            adapter_address: record.adapter_address.clone(),
            max_slippage: record.max_slippage,
            min_swap_proceeds: record.min_swap_proceeds,
            min_exchange_rate: record.min_exchange_rate,
            dest_asset: DestAsset::from_symbol(&record.dest_asset),
            params: record.params.clone(),
        },
        transactions: Vec::new(),
    }
}

/// Flatten a session back into a record with the given label and error flag
pub fn to_record(session: &GatewaySession, awaiting: AwaitingLabel, error: bool) -> TransactionRecord {
    let deposit = session.active_deposit();
    let network = session.network.as_str().to_string();

    TransactionRecord {
        id: session.id.clone(),
        direction: session.direction,
        source_asset: session.source_asset.clone(),
        source_network: session.source_chain.clone(),
        source_network_version: network.clone(),
        dest_asset: session.custom_params.dest_asset.as_str().to_string(),
        dest_network: session.dest_chain.clone(),
        dest_network_version: network,
        dest_address: session.dest_address.clone(),
        amount: session.target_amount,
        ren_btc_address: session.gateway_address.clone(),
        local_web3_address: session.user_address.clone(),
        source_tx_hash: deposit.map(|d| d.source_tx_hash.clone()),
        source_amount: deposit.and_then(|d| d.source_tx_amount),
        source_tx_confs: deposit.map_or(0, |d| d.source_tx_confs),
        source_tx_v_out: deposit.map_or(0, |d| d.source_tx_v_out),
        dest_tx_hash: deposit.and_then(|d| d.dest_tx_hash.clone()),
        dest_tx_confs: deposit.map_or(0, |d| d.dest_tx_confs),
        ren_signature: deposit.and_then(|d| d.ren_signature.clone()),
        ren_response: deposit.and_then(|d| d.ren_response.clone()),
        params: TxParams {
            nonce: session.nonce.clone(),
        },
        adapter_address: session.custom_params.adapter_address.clone(),
        max_slippage: session.custom_params.max_slippage,
        min_swap_proceeds: session.custom_params.min_swap_proceeds,
        min_exchange_rate: session.custom_params.min_exchange_rate,
        exchange_rate_on_submit: None,
        tx_created_at: None,
        instant: false,
        awaiting,
        error,
    }
}
