//! Cover payout assets.
//!
//! The staking and burn engines only move NXM; the asset a cover pays out in
//! is carried along on covers and claims for the payout layer.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverAsset {
    /// The chain's native currency.
    Eth,
    /// Any ERC20-class token.
    Erc20 { symbol: String, decimals: u8 },
}

impl CoverAsset {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Eth => "ETH",
            Self::Erc20 { symbol, .. } => symbol,
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            Self::Eth => 18,
            Self::Erc20 { decimals, .. } => *decimals,
        }
    }
}

impl fmt::Display for CoverAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
