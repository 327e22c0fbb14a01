//! cafe-api: HTTP API layer for wbtc.cafe
//!
//! Exposes fee quotes and the transaction lifecycle to the frontend.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::{AppState, Services};
