//! Contract ABI encoding/decoding utilities
//!
//! Only the static/dynamic head-tail layout needed for adapter and pool calls:
//! - `uint256` / `int128`: 32-byte big-endian words (ints sign-extended)
//! - `address`: 20 bytes left-padded to a word
//! - `bytes32`: one word
//! - `bytes`: offset in the head, then length word + right-padded data in the tail

use num_bigint::BigUint;
use sha3::{Digest, Keccak256};
use thiserror::Error;

const WORD: usize = 32;

/// ABI encoding/decoding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid unsigned integer: {0}")]
    InvalidUint(String),

    #[error("Value does not fit in 256 bits")]
    Overflow,

    #[error("Return data too short: {len} bytes")]
    ShortReturnData { len: usize },
}

/// A single ABI-encodable value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(BigUint),
    Int(i128),
    Address([u8; 20]),
    FixedBytes32([u8; 32]),
    Bytes(Vec<u8>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }
}

/// First four bytes of the keccak256 hash of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Encode a full call: selector followed by the encoded arguments
pub fn encode_call(signature: &str, tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    let mut data = selector(signature).to_vec();
    data.extend(encode_tokens(tokens)?);
    Ok(data)
}

/// Encode a tuple of tokens using the head/tail layout
pub fn encode_tokens(tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend(uint_word(&BigUint::from(head_len + tail.len()))?);
            if let Token::Bytes(bytes) = token {
                tail.extend(uint_word(&BigUint::from(bytes.len()))?);
                tail.extend(right_pad(bytes));
            }
        } else {
            head.extend(static_word(token)?);
        }
    }

    head.extend(tail);
    Ok(head)
}

fn static_word(token: &Token) -> Result<[u8; WORD], AbiError> {
    match token {
        Token::Uint(value) => uint_word(value),
        Token::Int(value) => {
            let fill = if *value < 0 { 0xff } else { 0x00 };
            let mut word = [fill; WORD];
            word[WORD - 16..].copy_from_slice(&value.to_be_bytes());
            Ok(word)
        }
        Token::Address(addr) => {
            let mut word = [0u8; WORD];
            word[WORD - 20..].copy_from_slice(addr);
            Ok(word)
        }
        Token::FixedBytes32(bytes) => Ok(*bytes),
        Token::Bytes(_) => unreachable!("dynamic tokens are encoded in the tail"),
    }
}

fn uint_word(value: &BigUint) -> Result<[u8; WORD], AbiError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > WORD {
        return Err(AbiError::Overflow);
    }
    let mut word = [0u8; WORD];
    word[WORD - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

fn right_pad(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(WORD) * WORD;
    let mut out = bytes.to_vec();
    out.resize(padded_len, 0);
    out
}

/// Decode the first return word as a uint256
pub fn decode_uint256(data: &[u8]) -> Result<BigUint, AbiError> {
    if data.len() < WORD {
        return Err(AbiError::ShortReturnData { len: data.len() });
    }
    Ok(BigUint::from_bytes_be(&data[..WORD]))
}

/// Parse a 0x-prefixed (or bare) hex string into bytes
pub fn parse_hex_bytes(value: &str) -> Result<Vec<u8>, AbiError> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(trimmed).map_err(|e| AbiError::InvalidHex(format!("{}: {}", value, e)))
}

/// Parse a 20-byte Ethereum address
pub fn parse_address(value: &str) -> Result<[u8; 20], AbiError> {
    let bytes = parse_hex_bytes(value).map_err(|_| AbiError::InvalidAddress(value.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| AbiError::InvalidAddress(value.to_string()))
}

/// Parse a decimal unsigned integer string
pub fn parse_uint(value: &str) -> Result<BigUint, AbiError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AbiError::InvalidUint(value.to_string()));
    }
    BigUint::parse_bytes(value.as_bytes(), 10).ok_or_else(|| AbiError::InvalidUint(value.to_string()))
}

/// Hex-encode call data with a 0x prefix
pub fn to_hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}
