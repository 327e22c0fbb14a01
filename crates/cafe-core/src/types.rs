//! Core type definitions for wbtc.cafe

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction hash on either chain (hex on Ethereum, txid on Bitcoin)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ethereum account or contract address (0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EthAddress(pub String);

impl EthAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Basic shape check: `0x` followed by 40 hex characters
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 42
            && self.0.starts_with("0x")
            && self.0[2..].chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network version shared by both chains of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// `"testnet"` maps to itself, anything else is mainnet.
    pub fn from_version(version: &str) -> Self {
        if version == "testnet" {
            Self::Testnet
        } else {
            Self::Mainnet
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conversion direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// BTC locked on Bitcoin, wrapped asset minted and swapped on Ethereum
    Mint,
    /// Wrapped asset swapped and burned on Ethereum, BTC released on Bitcoin
    Burn,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Burn => "burn",
        }
    }

    /// Infer the direction from a source asset symbol.
    ///
    /// Only a BTC source (case-insensitive) is a mint.
    pub fn from_source_asset(symbol: &str) -> Self {
        if symbol.eq_ignore_ascii_case(asset::BTC) {
            Self::Mint
        } else {
            Self::Burn
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Asset the user ends up holding on the destination chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestAsset {
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "WBTC")]
    Wbtc,
}

impl DestAsset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Btc => asset::BTC,
            Self::Wbtc => asset::WBTC,
        }
    }

    /// Exactly `"BTC"` selects BTC; everything else is WBTC.
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol == asset::BTC {
            Self::Btc
        } else {
            Self::Wbtc
        }
    }
}

impl fmt::Display for DestAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Satoshi amount (1 BTC = 100_000_000 sats)
pub type Sats = u64;

/// Block height on either chain
pub type BlockHeight = u64;

/// Asset symbols as they appear in persisted records
pub mod asset {
    pub const BTC: &str = "BTC";
    pub const WBTC: &str = "WBTC";
    pub const RENBTC: &str = "renBTC";
}

/// Chain identifiers as they appear in persisted records
pub mod chain {
    pub const BITCOIN: &str = "bitcoin";
    pub const ETHEREUM: &str = "ethereum";
}

/// Constants
pub mod constants {
    use super::Sats;

    /// Decimal places of BTC and its wrapped representations
    pub const BTC_DECIMALS: u32 = 8;

    /// 1 BTC in sats
    pub const SATS_PER_BTC: Sats = 100_000_000;

    /// Basis-point divisor for relay fee rates
    pub const BPS_DIVISOR: f64 = 10_000.0;
}

/// Convert a BTC-denominated amount to sats, rounding to the nearest unit.
///
/// Negative and non-finite inputs clamp to zero.
pub fn btc_to_sats(amount: f64) -> Sats {
    let sats = (amount * constants::SATS_PER_BTC as f64).round();
    if sats.is_finite() && sats > 0.0 {
        sats as Sats
    } else {
        0
    }
}

/// Convert sats to a BTC-denominated amount
pub fn sats_to_btc(sats: Sats) -> f64 {
    sats as f64 / constants::SATS_PER_BTC as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_version() {
        assert_eq!(Network::from_version("testnet"), Network::Testnet);
        assert_eq!(Network::from_version("mainnet"), Network::Mainnet);
        assert_eq!(Network::from_version("devnet"), Network::Mainnet);
        assert_eq!(Network::from_version(""), Network::Mainnet);
    }

    #[test]
    fn test_direction_from_source_asset() {
        assert_eq!(Direction::from_source_asset("BTC"), Direction::Mint);
        assert_eq!(Direction::from_source_asset("btc"), Direction::Mint);
        assert_eq!(Direction::from_source_asset("WBTC"), Direction::Burn);
        assert_eq!(Direction::from_source_asset("renBTC"), Direction::Burn);
    }

    #[test]
    fn test_dest_asset_symbol() {
        assert_eq!(DestAsset::from_symbol("BTC"), DestAsset::Btc);
        assert_eq!(DestAsset::from_symbol("btc"), DestAsset::Wbtc);
        assert_eq!(DestAsset::from_symbol("WBTC"), DestAsset::Wbtc);
        assert_eq!(
            serde_json::to_string(&DestAsset::Wbtc).unwrap(),
            "\"WBTC\""
        );
    }

    #[test]
    fn test_eth_address_shape() {
        assert!(EthAddress::new("0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08").is_well_formed());
        assert!(!EthAddress::new("0x742d35").is_well_formed());
        assert!(!EthAddress::new("742d35Cc6634C0532925a3b844Bc9e7595f2bD0899").is_well_formed());
    }

    #[test]
    fn test_sats_conversion() {
        assert_eq!(btc_to_sats(0.01), 1_000_000);
        assert_eq!(btc_to_sats(0.000000015), 2);
        assert_eq!(btc_to_sats(-1.0), 0);
        assert_eq!(btc_to_sats(f64::NAN), 0);
        assert_eq!(sats_to_btc(150_000_000), 1.5);
    }
}
