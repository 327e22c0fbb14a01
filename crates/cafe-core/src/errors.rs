//! Error types for wbtc.cafe

use thiserror::Error;

/// Core errors that can occur in wbtc.cafe
#[derive(Debug, Error)]
pub enum Error {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// JSON-RPC transport and query errors (Ethereum node, relay network)
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Endpoint unreachable at {url}")]
    Unreachable { url: String },

    #[error("Endpoint returned error: {message}")]
    ApiError { message: String },

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Contract call reverted: {reason}")]
    CallReverted { reason: String },
}

/// Protocol-level errors raised by gateway actions
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Missing required data: {field}")]
    MissingData { field: &'static str },

    #[error("Action not allowed: {reason}")]
    ActionNotAllowed { reason: String },
}

/// Result type alias for wbtc.cafe operations
pub type Result<T> = std::result::Result<T, Error>;

impl ProtocolError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingData { .. } => "missing_data",
            Self::ActionNotAllowed { .. } => "action_not_allowed",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ActionNotAllowed { .. } => 422,
            Self::MissingData { .. } => 503,
        }
    }
}
