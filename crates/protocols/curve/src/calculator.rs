//! Quote Conversions
//!
//! Pool outputs are uint256 values in the coin's smallest unit (8 decimals for
//! both renBTC and WBTC).

use cafe_core::constants::SATS_PER_BTC;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Convert a pool output in smallest units to a BTC-denominated amount
pub fn dy_to_btc(dy: &BigUint) -> f64 {
    dy.to_f64().unwrap_or(0.0) / SATS_PER_BTC as f64
}

/// Output per unit of input; zero when there is no input
pub fn effective_rate(output: f64, input: f64) -> f64 {
    if input == 0.0 || !input.is_finite() {
        return 0.0;
    }
    output / input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dy_to_btc() {
        assert_eq!(dy_to_btc(&BigUint::from(150_000_000u64)), 1.5);
        assert_eq!(dy_to_btc(&BigUint::from(0u32)), 0.0);
    }

    #[test]
    fn test_effective_rate() {
        assert_eq!(effective_rate(0.99, 1.0), 0.99);
        assert_eq!(effective_rate(5.0, 0.0), 0.0);
    }
}
