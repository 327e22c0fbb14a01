//! Bridge constants

use cafe_core::Network;

/// Adapter entry point for BTC -> WBTC
pub const MINT_THEN_SWAP: &str = "mintThenSwap";

/// Adapter entry point for WBTC -> BTC
pub const SWAP_THEN_BURN: &str = "swapThenBurn";

/// Relay JSON-RPC method returning lock/release fees and mint/burn rates
pub const QUERY_FEES_METHOD: &str = "ren_queryFees";

/// Displayed (and serialized) burn total when fees eat the whole output
pub const LEGACY_ZERO_TOTAL: &str = "0.000000";

/// Fixed-point factor for slippage parameters (1.0 == 10000)
pub const SLIPPAGE_SCALE: f64 = 10_000.0;

/// Chains whose confirmations the bridge waits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementChain {
    Bitcoin,
    Ethereum,
}

/// Confirmations required before a chain's transaction counts as settled
pub fn target_confs(network: Network, chain: SettlementChain) -> u64 {
    match (chain, network) {
        (SettlementChain::Ethereum, Network::Testnet) => 13,
        (SettlementChain::Ethereum, Network::Mainnet) => 30,
        (SettlementChain::Bitcoin, Network::Testnet) => 2,
        (SettlementChain::Bitcoin, Network::Mainnet) => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_confs() {
        assert_eq!(target_confs(Network::Testnet, SettlementChain::Ethereum), 13);
        assert_eq!(target_confs(Network::Mainnet, SettlementChain::Ethereum), 30);
        assert_eq!(target_confs(Network::Testnet, SettlementChain::Bitcoin), 2);
        assert_eq!(target_confs(Network::Mainnet, SettlementChain::Bitcoin), 6);
    }
}
