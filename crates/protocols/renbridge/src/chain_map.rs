//! Adapter contract calls and per-direction chain tables
//!
//! Builds the typed parameter lists for `mintThenSwap` and `swapThenBurn`.
//! Nothing here touches the network; submission happens elsewhere.
//!
//! Some parameters only take part in one half of the call: `notInPayload`
//! ones are passed to the contract but excluded from the payload the relay
//! signs over, `onlyInPayload` ones are signed over but never passed.

use cafe_core::constants::BTC_DECIMALS;
use cafe_core::{btc_to_sats, chain, Direction};
use eth_rpc_client::abi::{self, AbiError, Token};
use serde::Serialize;

use crate::constants::{MINT_THEN_SWAP, SLIPPAGE_SCALE, SWAP_THEN_BURN};
use crate::session::GatewaySession;

/// Errors from building calls
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChainMapError {
    #[error("Session is missing {field}")]
    MissingField { field: &'static str },

    #[error("No {side} chain '{chain}' for {direction}")]
    UnsupportedChain {
        side: &'static str,
        chain: String,
        direction: Direction,
    },

    #[error("Bad value for {name}: {source}")]
    Encode { name: String, source: AbiError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    #[serde(rename = "uint256")]
    Uint256,
    #[serde(rename = "address")]
    Address,
    #[serde(rename = "bytes32")]
    Bytes32,
    #[serde(rename = "bytes")]
    Bytes,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uint256 => "uint256",
            Self::Address => "address",
            Self::Bytes32 => "bytes32",
            Self::Bytes => "bytes",
        }
    }
}

/// One named, typed argument. Values are strings: decimal integers for
/// `uint256`, hex for everything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractParam {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub not_in_payload: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub only_in_payload: bool,
}

impl ContractParam {
    pub fn new(name: &'static str, ty: ParamType, value: impl Into<String>) -> Self {
        Self {
            name,
            ty,
            value: value.into(),
            not_in_payload: false,
            only_in_payload: false,
        }
    }

    fn not_in_payload(mut self) -> Self {
        self.not_in_payload = true;
        self
    }

    fn only_in_payload(mut self) -> Self {
        self.only_in_payload = true;
        self
    }

    fn to_token(&self) -> Result<Token, ChainMapError> {
        let encode_err = |source| ChainMapError::Encode {
            name: self.name.to_string(),
            source,
        };
        match self.ty {
            ParamType::Uint256 => abi::parse_uint(&self.value).map(Token::Uint),
            ParamType::Address => abi::parse_address(&self.value).map(Token::Address),
            ParamType::Bytes32 => abi::parse_hex_bytes(&self.value).and_then(|bytes| {
                <[u8; 32]>::try_from(bytes.as_slice())
                    .map(Token::FixedBytes32)
                    .map_err(|_| AbiError::InvalidHex(self.value.clone()))
            }),
            ParamType::Bytes => abi::parse_hex_bytes(&self.value).map(Token::Bytes),
        }
        .map_err(encode_err)
    }
}

/// Descriptor of a call on the adapter contract
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCall {
    pub send_to: String,
    pub contract_fn: &'static str,
    pub contract_params: Vec<ContractParam>,
}

impl ContractCall {
    pub fn param(&self, name: &str) -> Option<&ContractParam> {
        self.contract_params.iter().find(|p| p.name == name)
    }

    /// Arguments actually passed to the contract
    pub fn call_params(&self) -> impl Iterator<Item = &ContractParam> {
        self.contract_params.iter().filter(|p| !p.only_in_payload)
    }

    /// Arguments the relay signs over
    pub fn payload_params(&self) -> impl Iterator<Item = &ContractParam> {
        self.contract_params.iter().filter(|p| !p.not_in_payload)
    }

    /// Solidity signature of the call, e.g. `swapThenBurn(bytes,uint256,uint256)`
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.call_params().map(|p| p.ty.as_str()).collect();
        format!("{}({})", self.contract_fn, types.join(","))
    }

    /// Full call data (selector and arguments)
    pub fn encode(&self) -> Result<Vec<u8>, ChainMapError> {
        let tokens = self
            .call_params()
            .map(ContractParam::to_token)
            .collect::<Result<Vec<_>, _>>()?;
        abi::encode_call(&self.signature(), &tokens).map_err(|source| ChainMapError::Encode {
            name: self.contract_fn.to_string(),
            source,
        })
    }

    /// Append the relay's mint proof: minted amount, nHash and signature
    pub fn with_mint_proof(mut self, amount: u64, nhash: &str, signature: &str) -> Self {
        self.contract_params.extend([
            ContractParam::new("_amount", ParamType::Uint256, amount.to_string()),
            ContractParam::new("_nHash", ParamType::Bytes32, nhash),
            ContractParam::new("_sig", ParamType::Bytes, signature),
        ]);
        self
    }
}

/// Scale a rate by `10^decimals`, dropping the fractional part.
///
/// Works on the shortest decimal form of `value` so that 0.29 scales to
/// 29000000, not the 28999999 a float multiply gives. Negative results
/// encode as zero since the parameter is unsigned.
pub fn scale_truncated(value: f64, decimals: u32) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "0".to_string();
    }
    let repr = value.to_string();
    let (whole, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let mut digits = whole.to_string();
    digits.extend(
        fraction
            .chars()
            .chain(std::iter::repeat('0'))
            .take(decimals as usize),
    );

    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Slippage fraction as a fixed-point integer (0.01 -> "100")
pub fn scale_slippage(slippage: f64) -> String {
    let scaled = (slippage * SLIPPAGE_SCALE).round();
    if scaled.is_finite() && scaled > 0.0 {
        format!("{:.0}", scaled)
    } else {
        "0".to_string()
    }
}

/// `mintThenSwap` for a mint session.
///
/// `new_min_exchange_rate` fills `_newMinExchangeRate`; when absent it takes
/// the stored minimum. The two are independent inputs.
pub fn mint_then_swap(
    session: &GatewaySession,
    new_min_exchange_rate: Option<f64>,
) -> Result<ContractCall, ChainMapError> {
    let params = &session.custom_params;
    let min_rate = params
        .min_exchange_rate
        .ok_or(ChainMapError::MissingField {
            field: "minExchangeRate",
        })?;
    let new_min_rate = new_min_exchange_rate.unwrap_or(min_rate);
    // BTC is the only asset the gateway locks
    let decimals = BTC_DECIMALS;

    Ok(ContractCall {
        send_to: params.adapter_address.clone(),
        contract_fn: MINT_THEN_SWAP,
        contract_params: vec![
            ContractParam::new(
                "_minExchangeRate",
                ParamType::Uint256,
                scale_truncated(min_rate, decimals),
            ),
            ContractParam::new(
                "_newMinExchangeRate",
                ParamType::Uint256,
                scale_truncated(new_min_rate, decimals),
            )
            .not_in_payload(),
            ContractParam::new(
                "_slippage",
                ParamType::Uint256,
                scale_slippage(params.max_slippage),
            ),
            ContractParam::new("_wbtcDestination", ParamType::Address, &session.dest_address),
            ContractParam::new("_msgSender", ParamType::Address, &session.user_address)
                .only_in_payload(),
        ],
    })
}

/// `swapThenBurn` for a burn session
pub fn swap_then_burn(session: &GatewaySession) -> Result<ContractCall, ChainMapError> {
    if session.dest_address.is_empty() {
        return Err(ChainMapError::MissingField {
            field: "destAddress",
        });
    }
    // The adapter takes the Bitcoin address as its raw string bytes
    let destination = abi::to_hex_data(session.dest_address.as_bytes());

    Ok(ContractCall {
        send_to: session.custom_params.adapter_address.clone(),
        contract_fn: SWAP_THEN_BURN,
        contract_params: vec![
            ContractParam::new("_btcDestination", ParamType::Bytes, destination),
            ContractParam::new(
                "_amount",
                ParamType::Uint256,
                btc_to_sats(session.target_amount).to_string(),
            ),
            ContractParam::new(
                "_minRenbtcAmount",
                ParamType::Uint256,
                btc_to_sats(session.custom_params.min_swap_proceeds).to_string(),
            ),
        ],
    })
}

/// Handle for a chain that needs no contract call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChainHandle {
    /// Lock side of a mint
    Bitcoin,
    /// Release side of a burn, paying out to this address
    BitcoinAddress { address: String },
}

/// What a chain table yields for one side of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChainTarget {
    Contract(ContractCall),
    Chain(ChainHandle),
}

/// Source and destination tables handed to a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainMaps {
    pub direction: Direction,
}

impl ChainMaps {
    pub fn for_direction(direction: Direction) -> Self {
        Self { direction }
    }

    /// Lock table for mints, burn table for burns
    pub fn source(&self, chain_name: &str, session: &GatewaySession) -> Result<ChainTarget, ChainMapError> {
        match (self.direction, chain_name) {
            (Direction::Mint, chain::BITCOIN) => Ok(ChainTarget::Chain(ChainHandle::Bitcoin)),
            (Direction::Burn, chain::ETHEREUM) => swap_then_burn(session).map(ChainTarget::Contract),
            _ => Err(self.unsupported("source", chain_name)),
        }
    }

    /// Mint table for mints, release table for burns
    pub fn destination(
        &self,
        chain_name: &str,
        session: &GatewaySession,
    ) -> Result<ChainTarget, ChainMapError> {
        match (self.direction, chain_name) {
            (Direction::Mint, chain::ETHEREUM) => {
                mint_then_swap(session, None).map(ChainTarget::Contract)
            }
            (Direction::Burn, chain::BITCOIN) => Ok(ChainTarget::Chain(ChainHandle::BitcoinAddress {
                address: session.dest_address.clone(),
            })),
            _ => Err(self.unsupported("destination", chain_name)),
        }
    }

    fn unsupported(&self, side: &'static str, chain_name: &str) -> ChainMapError {
        ChainMapError::UnsupportedChain {
            side,
            chain: chain_name.to_string(),
            direction: self.direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::to_session;
    use crate::record::fixtures::{burn_record, mint_record};

    #[test]
    fn test_scaling() {
        assert_eq!(scale_slippage(0.01), "100");
        assert_eq!(scale_slippage(0.005), "50");
        assert_eq!(scale_truncated(0.995, 8), "99500000");
        // 0.000123456789 BTC is 12345.6789 sats; truncation keeps 12345
        assert_eq!(scale_truncated(0.000123456789, 8), "12345");
        assert_eq!(scale_truncated(-1.0, 8), "0");
    }

    #[test]
    fn test_scaling_ignores_float_noise() {
        // each of these lands just below an integer when multiplied as f64
        assert_eq!(scale_truncated(0.29, 8), "29000000");
        assert_eq!(scale_truncated(0.57, 8), "57000000");
        assert_eq!(scale_truncated(0.58, 8), "58000000");
        assert_eq!(scale_truncated(1.005, 8), "100500000");
        assert_eq!(scale_truncated(12.0, 8), "1200000000");
        assert_eq!(scale_truncated(0.000000001, 8), "0");
        assert_eq!(scale_truncated(0.0, 8), "0");
    }

    #[test]
    fn test_mint_then_swap_params() {
        let session = to_session(&mint_record());
        let call = mint_then_swap(&session, None).unwrap();

        assert_eq!(call.contract_fn, "mintThenSwap");
        assert_eq!(call.send_to, "0x2b21F32Fbc4C4B5e7e25E0A71B4f2d8F1E8aF3b1");
        let names: Vec<_> = call.contract_params.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            ["_minExchangeRate", "_newMinExchangeRate", "_slippage", "_wbtcDestination", "_msgSender"]
        );
        assert_eq!(call.param("_minExchangeRate").unwrap().value, "99500000");
        assert_eq!(call.param("_newMinExchangeRate").unwrap().value, "99500000");
        assert_eq!(call.param("_slippage").unwrap().value, "100");
        assert!(call.param("_newMinExchangeRate").unwrap().not_in_payload);
        assert!(call.param("_msgSender").unwrap().only_in_payload);
        assert_eq!(
            call.param("_msgSender").unwrap().value,
            "0xEA8b2fF0d7f546AFAeAE1771306736357dEFa434"
        );
    }

    #[test]
    fn test_new_min_rate_is_independent() {
        let session = to_session(&mint_record());
        let call = mint_then_swap(&session, Some(1.25)).unwrap();
        assert_eq!(call.param("_minExchangeRate").unwrap().value, "99500000");
        assert_eq!(call.param("_newMinExchangeRate").unwrap().value, "125000000");
    }

    #[test]
    fn test_mint_requires_min_rate() {
        let mut session = to_session(&mint_record());
        session.custom_params.min_exchange_rate = None;
        assert_eq!(
            mint_then_swap(&session, None),
            Err(ChainMapError::MissingField {
                field: "minExchangeRate"
            })
        );
    }

    #[test]
    fn test_payload_split() {
        let call = mint_then_swap(&to_session(&mint_record()), None).unwrap();
        let call_names: Vec<_> = call.call_params().map(|p| p.name).collect();
        let payload_names: Vec<_> = call.payload_params().map(|p| p.name).collect();
        assert!(!call_names.contains(&"_msgSender"));
        assert!(!payload_names.contains(&"_newMinExchangeRate"));
    }

    #[test]
    fn test_mint_call_encoding_with_proof() {
        let call = mint_then_swap(&to_session(&mint_record()), None)
            .unwrap()
            .with_mint_proof(49_800_000, &format!("0x{}", "11".repeat(32)), "0xabcd");

        assert_eq!(
            call.signature(),
            "mintThenSwap(uint256,uint256,uint256,address,uint256,bytes32,bytes)"
        );
        let data = call.encode().unwrap();
        assert_eq!(&data[..4], &abi::selector(&call.signature()));
        // seven head words, then length word and one padded word for `_sig`
        assert_eq!(data.len(), 4 + 9 * 32);
        assert_eq!(data[4 + 5 * 32], 0x11);
    }

    #[test]
    fn test_swap_then_burn_params() {
        let session = to_session(&burn_record());
        let call = swap_then_burn(&session).unwrap();

        assert_eq!(call.contract_fn, "swapThenBurn");
        assert_eq!(call.signature(), "swapThenBurn(bytes,uint256,uint256)");
        assert_eq!(call.param("_amount").unwrap().value, "25000000");
        assert_eq!(call.param("_minRenbtcAmount").unwrap().value, "24750000");

        let destination = &call.param("_btcDestination").unwrap().value;
        let bytes = abi::parse_hex_bytes(destination).unwrap();
        assert_eq!(bytes, session.dest_address.as_bytes());
        assert!(call.encode().is_ok());
    }

    #[test]
    fn test_bad_param_value_reports_name() {
        let mut session = to_session(&mint_record());
        session.dest_address = "not-an-address".into();
        let err = mint_then_swap(&session, None).unwrap().encode().unwrap_err();
        assert!(matches!(err, ChainMapError::Encode { ref name, .. } if name == "_wbtcDestination"));
    }

    #[test]
    fn test_chain_tables() {
        let mint = to_session(&mint_record());
        let burn = to_session(&burn_record());

        let maps = ChainMaps::for_direction(Direction::Mint);
        assert_eq!(maps.source("bitcoin", &mint).unwrap(), ChainTarget::Chain(ChainHandle::Bitcoin));
        assert!(matches!(
            maps.destination("ethereum", &mint).unwrap(),
            ChainTarget::Contract(ref c) if c.contract_fn == "mintThenSwap"
        ));
        assert!(maps.source("ethereum", &mint).is_err());

        let maps = ChainMaps::for_direction(Direction::Burn);
        assert!(matches!(
            maps.source("ethereum", &burn).unwrap(),
            ChainTarget::Contract(ref c) if c.contract_fn == "swapThenBurn"
        ));
        assert_eq!(
            maps.destination("bitcoin", &burn).unwrap(),
            ChainTarget::Chain(ChainHandle::BitcoinAddress {
                address: burn.dest_address.clone()
            })
        );
        assert!(matches!(
            maps.destination("solana", &burn),
            Err(ChainMapError::UnsupportedChain { side: "destination", .. })
        ));
    }
}
