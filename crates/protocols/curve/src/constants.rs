//! Curve pool constants

/// `get_dy` on plain Curve pools takes signed coin indices
pub const GET_DY_SIGNATURE: &str = "get_dy(int128,int128,uint256)";

/// Coin indices of the renBTC/WBTC pool
pub mod pool_indices {
    /// Relay-minted BTC (what the relay network mints and burns)
    pub const RENBTC: i128 = 0;
    /// Wrapped BTC (what the user receives or spends)
    pub const WBTC: i128 = 1;
}
