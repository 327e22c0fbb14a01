//! Curve Stable-Swap Pool Quoting
//!
//! The renBTC/WBTC pool is used purely as a price oracle for the swap leg of
//! a conversion: `get_dy(i, j, dx)` returns how many units of coin `j` a
//! swap of `dx` units of coin `i` would yield right now.

pub mod calculator;
pub mod constants;
pub mod quoter;

pub use calculator::{dy_to_btc, effective_rate};
pub use constants::{pool_indices, GET_DY_SIGNATURE};
pub use quoter::{CurveError, CurvePool, PoolQuoter};
