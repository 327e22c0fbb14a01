//! Exchange-rate check before a mint is finalized
//!
//! The rate is re-quoted for the amount the relay actually minted. If it has
//! fallen below the user's minimum the transaction is parked at `eth-init`
//! and the user is prompted; they may then accept the swap at the lower rate.

use cafe_core::{sats_to_btc, DestAsset};
use curve::PoolQuoter;
use serde::Serialize;

use crate::calculator::{final_deposit_exchange_rate, CalcError};
use crate::fee::RelayFees;
use crate::record::TransactionRecord;
use crate::status::AwaitingLabel;
use crate::store::{StoreError, TransactionStore};

/// Ask the user whether to accept a lower rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertPrompt {
    pub tx_id: String,
    /// Live rate, 8 decimal places
    pub exchange_rate: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Build and submit the mint with this `_newMinExchangeRate`
    Proceed {
        record: TransactionRecord,
        exchange_rate: f64,
        new_min_exchange_rate: f64,
    },
    /// Rate too low; the user was prompted and nothing was submitted
    Halted {
        record: TransactionRecord,
        prompt: RevertPrompt,
    },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GuardError {
    #[error("Transaction has no relay response")]
    MissingRelayResponse,

    #[error("Missing exchange rates")]
    MissingExchangeRate,

    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run the guard for a signed mint.
///
/// `approve_swapped_asset` is the user's answer to an earlier prompt; any
/// answer skips the halt, and `WBTC` additionally relaxes the minimum to
/// `floor(rate) - 1`. `prompt` is called at most once, only on a halt.
pub async fn check_completion(
    record: &TransactionRecord,
    approve_swapped_asset: Option<DestAsset>,
    fees: Option<&RelayFees>,
    pool: &dyn PoolQuoter,
    store: &dyn TransactionStore,
    prompt: impl FnOnce(RevertPrompt),
) -> Result<GuardOutcome, GuardError> {
    let response = record
        .ren_response
        .as_ref()
        .ok_or(GuardError::MissingRelayResponse)?;
    let deposited = response
        .utxo
        .as_ref()
        .ok_or(GuardError::MissingRelayResponse)?;

    // The user may have sent more or less than they said they would
    let tx = store.update(TransactionRecord {
        source_amount: Some(sats_to_btc(deposited.amount)),
        ..record.clone()
    })?;

    let rate = final_deposit_exchange_rate(tx.ren_response.as_ref(), fees, pool).await?;
    let min_rate = tx.min_exchange_rate.filter(|r| *r > 0.0);
    let (rate, min_rate) = match (rate, min_rate) {
        (Some(rate), Some(min_rate)) if rate > 0.0 => (rate, min_rate),
        _ => return Err(GuardError::MissingExchangeRate),
    };

    let tx = store.update(TransactionRecord {
        exchange_rate_on_submit: Some(rate),
        ..tx
    })?;

    if approve_swapped_asset.is_none() && rate < min_rate {
        tracing::warn!(
            id = %tx.id,
            rate,
            min_rate,
            error_hint = "exchange rate changed",
            "Exchange rate below minimum"
        );
        let record = store.update(TransactionRecord {
            awaiting: AwaitingLabel::EthInit,
            error: false,
            ..tx
        })?;
        let revert = RevertPrompt {
            tx_id: record.id.clone(),
            exchange_rate: format!("{:.8}", rate),
        };
        prompt(revert.clone());
        return Ok(GuardOutcome::Halted {
            record,
            prompt: revert,
        });
    }

    let new_min_exchange_rate = match approve_swapped_asset {
        Some(DestAsset::Wbtc) => rate.floor() - 1.0,
        _ => min_rate,
    };

    Ok(GuardOutcome::Proceed {
        record: tx,
        exchange_rate: rate,
        new_min_exchange_rate,
    })
}
