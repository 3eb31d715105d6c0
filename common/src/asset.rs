//! Supported asset denominations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five asset denominations tracked per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    /// Toncoin.
    Ton,
    /// Tether (USD stablecoin).
    Usdt,
    /// Bitcoin.
    Btc,
    /// Ether.
    Eth,
    /// Solana.
    Sol,
}

impl Asset {
    /// All supported assets, in canonical order.
    pub const ALL: [Asset; 5] = [Asset::Ton, Asset::Usdt, Asset::Btc, Asset::Eth, Asset::Sol];

    /// Number of supported assets.
    pub const COUNT: usize = Self::ALL.len();

    /// Ticker symbol for this asset.
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Ton => "TON",
            Asset::Usdt => "USDT",
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Sol => "SOL",
        }
    }

    /// Parse an asset from its ticker symbol (case-insensitive).
    pub fn from_symbol(s: &str) -> Option<Asset> {
        match s.to_uppercase().as_str() {
            "TON" => Some(Asset::Ton),
            "USDT" => Some(Asset::Usdt),
            "BTC" => Some(Asset::Btc),
            "ETH" => Some(Asset::Eth),
            "SOL" => Some(Asset::Sol),
            _ => None,
        }
    }

    /// Position of this asset in [`Asset::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Asset::Ton => 0,
            Asset::Usdt => 1,
            Asset::Btc => 2,
            Asset::Eth => 3,
            Asset::Sol => 4,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
