//! Basic address validation for the two bridge chains

use cafe_core::{chain, EthAddress, Network};

/// Validate a destination address for a chain on a network version.
///
/// Performs format checks (prefix, length, charset), not checksum validation.
pub fn validate_target_address(chain_name: &str, address: &str, network: Network) -> Result<(), String> {
    if address.is_empty() {
        return Err("Address cannot be empty".to_string());
    }

    match chain_name {
        chain::BITCOIN => validate_bitcoin(address, network),
        chain::ETHEREUM => {
            if !address.starts_with("0x") {
                return Err("Ethereum address must start with '0x'".to_string());
            }
            if address.len() != 42 {
                return Err("Ethereum address must be 42 characters (0x + 40 hex chars)".to_string());
            }
            if !EthAddress::new(address).is_well_formed() {
                return Err("Address contains non-hex characters".to_string());
            }
            Ok(())
        }
        _ => Err(format!("Unsupported chain: {}", chain_name)),
    }
}

fn validate_bitcoin(address: &str, network: Network) -> Result<(), String> {
    let (bech32_hrp, legacy_prefixes): (&str, &[char]) = match network {
        Network::Mainnet => ("bc1", &['1', '3']),
        Network::Testnet => ("tb1", &['m', 'n', '2']),
    };

    let lower = address.to_ascii_lowercase();
    if lower.starts_with(bech32_hrp) {
        // bech32 strings are single-case
        if address != lower && address != address.to_ascii_uppercase() {
            return Err("Bitcoin address mixes upper and lower case".to_string());
        }
        if address.len() < 14 || address.len() > 74 {
            return Err("Invalid Bitcoin address length".to_string());
        }
        return Ok(());
    }

    if address.starts_with(legacy_prefixes) {
        if address.len() < 26 || address.len() > 35 {
            return Err("Invalid Bitcoin address length".to_string());
        }
        // base58 excludes 0, O, I and l
        if !address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
        {
            return Err("Address contains non-base58 characters".to_string());
        }
        return Ok(());
    }

    Err(format!("Not a {} Bitcoin address", network))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitcoin_mainnet() {
        let segwit = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
        assert!(validate_target_address("bitcoin", segwit, Network::Mainnet).is_ok());
        let legacy = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
        assert!(validate_target_address("bitcoin", legacy, Network::Mainnet).is_ok());
    }

    #[test]
    fn test_bitcoin_wrong_network() {
        let segwit = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
        assert!(validate_target_address("bitcoin", segwit, Network::Testnet).is_err());
        let testnet = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
        assert!(validate_target_address("bitcoin", testnet, Network::Testnet).is_ok());
        assert!(validate_target_address("bitcoin", testnet, Network::Mainnet).is_err());
    }

    #[test]
    fn test_bitcoin_bad_chars() {
        assert!(validate_target_address("bitcoin", "1A1zP1eP5QGefi2DMPTfTL5SLmv7Divf0a", Network::Mainnet).is_err());
        assert!(validate_target_address("bitcoin", "bc1qW508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", Network::Mainnet).is_err());
    }

    #[test]
    fn test_ethereum() {
        let addr = "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08";
        assert!(validate_target_address("ethereum", addr, Network::Mainnet).is_ok());
        assert!(validate_target_address("ethereum", "0x742d35", Network::Mainnet).is_err());
        assert!(validate_target_address(
            "ethereum",
            "0x742d35Cc6634C0532925a3b844Bc9e7595f2bDzz",
            Network::Mainnet
        )
        .is_err());
    }

    #[test]
    fn test_empty_and_unknown() {
        assert!(validate_target_address("bitcoin", "", Network::Mainnet).is_err());
        assert!(validate_target_address("solana", "abc", Network::Mainnet).is_err());
    }
}
