//! Awaiting-action labels derived from machine state
//!
//! Mint rows key off the active deposit's machine; burn rows key off the
//! top-level machine. Anything unknown (including a mint with no deposit yet)
//! falls back to `btc-init`. The label only drives a hint for the user and is
//! never fed back into a machine.

use std::fmt;

use cafe_core::Direction;
use serde::{Deserialize, Serialize};

use crate::machine::MachineSnapshot;

/// What the row is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AwaitingLabel {
    /// Waiting for the user's Bitcoin deposit (or for a burn to be released)
    #[default]
    BtcInit,
    /// Relay network is processing
    RenSettle,
    /// Ethereum transaction is confirming
    EthSettle,
    /// User must submit the Ethereum transaction
    EthInit,
    /// Bitcoin transaction is confirming
    BtcSettle,
    /// Nothing pending
    Complete,
}

impl AwaitingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BtcInit => "btc-init",
            Self::RenSettle => "ren-settle",
            Self::EthSettle => "eth-settle",
            Self::EthInit => "eth-init",
            Self::BtcSettle => "btc-settle",
            Self::Complete => "",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl From<String> for AwaitingLabel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ren-settle" => Self::RenSettle,
            "eth-settle" => Self::EthSettle,
            "eth-init" => Self::EthInit,
            "btc-settle" => Self::BtcSettle,
            "" => Self::Complete,
            _ => Self::BtcInit,
        }
    }
}

impl From<AwaitingLabel> for String {
    fn from(label: AwaitingLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for AwaitingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label for a mint, from the active deposit's state
pub fn resolve_mint(deposit_state: Option<&str>) -> AwaitingLabel {
    match deposit_state {
        Some("restoring" | "restored" | "srcConfirmed") => AwaitingLabel::RenSettle,
        Some("srcSettling") => AwaitingLabel::BtcSettle,
        Some("accepted") => AwaitingLabel::EthInit,
        Some("claiming" | "destInitiated") => AwaitingLabel::EthSettle,
        Some("completed") => AwaitingLabel::Complete,
        _ => AwaitingLabel::BtcInit,
    }
}

/// Label for a burn, from the top-level machine state
pub fn resolve_burn(state: Option<&str>) -> AwaitingLabel {
    match state {
        Some("restoring" | "restored" | "srcConfirmed") => AwaitingLabel::RenSettle,
        Some("srcSettling") => AwaitingLabel::EthSettle,
        Some("accepted") => AwaitingLabel::BtcInit,
        Some("claiming") => AwaitingLabel::BtcSettle,
        Some("destInitiated") => AwaitingLabel::EthSettle,
        Some("completed") => AwaitingLabel::Complete,
        _ => AwaitingLabel::BtcInit,
    }
}

/// Label for a machine snapshot, dispatching on the session's direction
pub fn resolve(snapshot: &MachineSnapshot) -> AwaitingLabel {
    match snapshot.session.direction {
        Direction::Mint => resolve_mint(snapshot.deposit_state.as_deref()),
        Direction::Burn => resolve_burn(snapshot.state.as_deref()),
    }
}
