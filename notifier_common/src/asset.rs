//! Tracked assets shared between client and server.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Set of assets the notifier fetches prices for and reports on.
///
/// The symbol form (`BTC`, `ETH`) is what the market data provider uses; parsing is
/// case-insensitive so `btc` and `Btc` resolve to the same asset.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Encode,
    Decode,
    Display,
    EnumString,
    EnumIter,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[strum(ascii_case_insensitive)]
pub enum Asset {
    /// Bitcoin.
    BTC,
    /// Ether.
    ETH,
}

impl Asset {
    /// Human-readable name used in rendered reports.
    pub fn name(&self) -> &'static str {
        match self {
            Asset::BTC => "Bitcoin",
            Asset::ETH => "Ethereum",
        }
    }

    /// Seed price for synthetic feeds.
    pub fn base_price(&self) -> f64 {
        match self {
            Asset::BTC => 60_000.0,
            Asset::ETH => 3_000.0,
        }
    }
}
