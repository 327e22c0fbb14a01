//! Swap economics
//!
//! Mint (BTC -> WBTC): the relay takes `amount * mint rate` plus the fixed
//! fee, and what is left is swapped renBTC -> WBTC (`get_dy(0, 1, ..)`).
//!
//! Burn (WBTC -> BTC): the whole amount is swapped WBTC -> renBTC
//! (`get_dy(1, 0, ..)`), then the relay takes `output * burn rate` plus the
//! fixed fee from the proceeds.
//!
//! A failed pool call yields no quote at all; the caller asks the user to try
//! again rather than showing a stale or zero rate.

use std::fmt;

use cafe_core::{btc_to_sats, sats_to_btc, Direction};
use curve::calculator::{dy_to_btc, effective_rate};
use curve::pool_indices::{RENBTC, WBTC};
use curve::PoolQuoter;
use serde::{Serialize, Serializer};

use crate::constants::LEGACY_ZERO_TOTAL;
use crate::fee::RelayFees;
use crate::record::RelayResponse;

/// Errors from quoting
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CalcError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Relay fees not loaded")]
    MissingFees,

    #[error("No relay response for deposit")]
    MissingRelayResponse,

    #[error("Relay reverted deposit: {reason}")]
    Reverted { reason: String },
}

/// Net amount the user receives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConversionTotal {
    Amount(f64),
    /// Burn output that fees consumed entirely. Older clients store and
    /// display this as the string `"0.000000"` rather than a number.
    LegacyZero,
}

impl ConversionTotal {
    /// Numeric value, with the legacy sentinel counting as zero
    pub fn value(&self) -> f64 {
        match self {
            Self::Amount(v) => *v,
            Self::LegacyZero => 0.0,
        }
    }
}

impl fmt::Display for ConversionTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(v) => write!(f, "{}", v),
            Self::LegacyZero => f.write_str(LEGACY_ZERO_TOTAL),
        }
    }
}

impl Serialize for ConversionTotal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Amount(v) => serializer.serialize_f64(*v),
            Self::LegacyZero => serializer.serialize_str(LEGACY_ZERO_TOTAL),
        }
    }
}

/// Quote for converting an amount in one direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub exchange_rate: f64,
    /// Dynamic relay fee (BTC)
    pub relay_fee: f64,
    /// Fixed network fee (BTC)
    pub network_fee: f64,
    pub total: ConversionTotal,
}

/// Quote `amount` (source-asset units) against the live pool.
///
/// `Ok(None)` means the pool could not be queried; the failure is logged.
pub async fn quote(
    amount: f64,
    direction: Direction,
    fees: &RelayFees,
    pool: &dyn PoolQuoter,
) -> Result<Option<FeeQuote>, CalcError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CalcError::InvalidAmount(amount));
    }

    let network_fee = fees.fixed_btc();
    let dynamic = fees.dynamic_rate(direction);

    match direction {
        Direction::Mint => {
            let relay_fee = amount * dynamic;
            let after_fees = (amount - relay_fee - network_fee).max(0.0);
            let after_sats = btc_to_sats(after_fees);

            if after_sats == 0 {
                return Ok(Some(FeeQuote {
                    exchange_rate: 0.0,
                    relay_fee,
                    network_fee,
                    total: ConversionTotal::Amount(0.0),
                }));
            }

            let dy = match pool.get_dy(RENBTC, WBTC, after_sats).await {
                Ok(dy) => dy_to_btc(&dy),
                Err(e) => {
                    tracing::error!(error = %e, error_hint = "mint quote", "Pool quote failed");
                    return Ok(None);
                }
            };

            Ok(Some(FeeQuote {
                exchange_rate: effective_rate(dy, after_fees),
                relay_fee,
                network_fee,
                total: ConversionTotal::Amount(dy),
            }))
        }
        Direction::Burn => {
            let dy = match pool.get_dy(WBTC, RENBTC, btc_to_sats(amount)).await {
                Ok(dy) => dy_to_btc(&dy),
                Err(e) => {
                    tracing::error!(error = %e, error_hint = "burn quote", "Pool quote failed");
                    return Ok(None);
                }
            };

            let relay_fee = dy * dynamic;
            let net = dy - relay_fee - network_fee;
            let total = if net > 0.0 {
                ConversionTotal::Amount(net)
            } else {
                ConversionTotal::LegacyZero
            };

            Ok(Some(FeeQuote {
                exchange_rate: effective_rate(dy, amount),
                relay_fee,
                network_fee,
                total,
            }))
        }
    }
}

/// Rate the user gets for a deposit the relay has already signed.
///
/// The minted amount (after the relay's fixed fee) loses the dynamic mint fee
/// and is quoted renBTC -> WBTC. `Ok(None)` when the pool call fails or
/// nothing is left to swap.
pub async fn final_deposit_exchange_rate(
    response: Option<&RelayResponse>,
    fees: Option<&RelayFees>,
    pool: &dyn PoolQuoter,
) -> Result<Option<f64>, CalcError> {
    let fees = fees.ok_or(CalcError::MissingFees)?;
    let response = response.ok_or(CalcError::MissingRelayResponse)?;
    if response.is_reverted() {
        return Err(CalcError::Reverted {
            reason: response.revert.clone().unwrap_or_default(),
        });
    }

    let dynamic = fees.dynamic_rate(Direction::Mint);
    let final_sats = (response.amount as f64 * (1.0 - dynamic)).round().max(0.0) as u64;
    if final_sats == 0 {
        return Ok(None);
    }

    match pool.get_dy(RENBTC, WBTC, final_sats).await {
        Ok(dy) => Ok(Some(effective_rate(dy_to_btc(&dy), sats_to_btc(final_sats)))),
        Err(e) => {
            tracing::error!(error = %e, error_hint = "final exchange rate", "Pool quote failed");
            Ok(None)
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use cafe_core::{RpcError, Sats};
    use curve::{CurveError, PoolQuoter};
    use num_bigint::BigUint;

    /// Pool returning `dx * rate` and recording every call
    pub struct FixedRatePool {
        pub rate: f64,
        pub fail: bool,
        pub calls: AtomicUsize,
        pub last: Mutex<Option<(i128, i128, Sats)>>,
    }

    impl FixedRatePool {
        pub fn new(rate: f64) -> Self {
            Self {
                rate,
                fail: false,
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(1.0)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_call(&self) -> Option<(i128, i128, Sats)> {
            *self.last.lock().unwrap()
        }
    }

    #[async_trait]
    impl PoolQuoter for FixedRatePool {
        async fn get_dy(&self, i: i128, j: i128, dx: Sats) -> Result<BigUint, CurveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((i, j, dx));
            if self.fail {
                return Err(CurveError::Rpc(RpcError::CallReverted {
                    reason: "execution reverted".into(),
                }));
            }
            Ok(BigUint::from((dx as f64 * self.rate).round() as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::FixedRatePool;
    use super::*;
    use crate::fee::fakes::testnet_fees;
    use crate::record::fixtures::signed_mint_record;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_mint_quote() {
        let pool = FixedRatePool::new(0.99);
        let quote = quote(1.0, Direction::Mint, &testnet_fees(), &pool)
            .await
            .unwrap()
            .unwrap();

        assert!(close(quote.relay_fee, 0.0025));
        assert!(close(quote.network_fee, 0.00035));
        // 1 - 0.0025 - 0.00035 = 0.99715 BTC swapped
        assert_eq!(pool.last_call(), Some((0, 1, 99_715_000)));
        assert!(close(quote.total.value(), 0.9871785));
        assert!(close(quote.exchange_rate, 0.99));
    }

    #[tokio::test]
    async fn test_mint_zero_path_skips_pool() {
        let pool = FixedRatePool::new(0.99);
        let quote = quote(0.0003, Direction::Mint, &testnet_fees(), &pool)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.exchange_rate, 0.0);
        assert_eq!(quote.total, ConversionTotal::Amount(0.0));
        assert_eq!(pool.calls(), 0);
    }

    #[tokio::test]
    async fn test_burn_quote() {
        let pool = FixedRatePool::new(0.98);
        let quote = quote(0.5, Direction::Burn, &testnet_fees(), &pool)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(pool.last_call(), Some((1, 0, 50_000_000)));
        assert!(close(quote.exchange_rate, 0.98));
        assert!(close(quote.relay_fee, 0.00049));
        // 0.49 - 0.00049 - 0.00035
        assert!(close(quote.total.value(), 0.48916));
    }

    #[tokio::test]
    async fn test_burn_fees_exceed_output_yield_legacy_zero() {
        let pool = FixedRatePool::new(0.99);
        let quote = quote(0.0003, Direction::Burn, &testnet_fees(), &pool)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.total, ConversionTotal::LegacyZero);
        assert_eq!(quote.total.to_string(), "0.000000");
        assert_eq!(serde_json::to_value(quote.total).unwrap(), "0.000000");
    }

    #[tokio::test]
    async fn test_pool_failure_yields_no_quote() {
        let pool = FixedRatePool::failing();
        let mint = quote(1.0, Direction::Mint, &testnet_fees(), &pool).await.unwrap();
        let burn = quote(1.0, Direction::Burn, &testnet_fees(), &pool).await.unwrap();
        assert!(mint.is_none());
        assert!(burn.is_none());
    }

    #[tokio::test]
    async fn test_invalid_amount() {
        let pool = FixedRatePool::new(1.0);
        assert_eq!(
            quote(0.0, Direction::Mint, &testnet_fees(), &pool).await,
            Err(CalcError::InvalidAmount(0.0))
        );
        assert!(quote(f64::NAN, Direction::Burn, &testnet_fees(), &pool).await.is_err());
    }

    #[tokio::test]
    async fn test_final_deposit_rate() {
        let pool = FixedRatePool::new(0.99);
        let record = signed_mint_record();
        let rate = final_deposit_exchange_rate(
            record.ren_response.as_ref(),
            Some(&testnet_fees()),
            &pool,
        )
        .await
        .unwrap()
        .unwrap();

        // 49_800_000 * (1 - 0.0025)
        assert_eq!(pool.last_call(), Some((0, 1, 49_675_500)));
        assert!(close(rate, 0.99));
    }

    #[tokio::test]
    async fn test_final_deposit_rate_errors() {
        let pool = FixedRatePool::new(0.99);
        let record = signed_mint_record();

        let missing_fees =
            final_deposit_exchange_rate(record.ren_response.as_ref(), None, &pool).await;
        assert_eq!(missing_fees, Err(CalcError::MissingFees));

        let mut reverted = record.ren_response.clone().unwrap();
        reverted.revert = Some("bad utxo".into());
        let result =
            final_deposit_exchange_rate(Some(&reverted), Some(&testnet_fees()), &pool).await;
        assert!(matches!(result, Err(CalcError::Reverted { .. })));
        assert_eq!(pool.calls(), 0);

        let failing = FixedRatePool::failing();
        let none = final_deposit_exchange_rate(
            record.ren_response.as_ref(),
            Some(&testnet_fees()),
            &failing,
        )
        .await
        .unwrap();
        assert!(none.is_none());
    }
}
