//! Orderbook-based arbitrage matching
//!
//! Given a target notional, a direction and a minimum acceptable spread,
//! computes the maximum jointly-executable quantity across the two legs of
//! an arbitrage pair using the best available liquidity signal: full depth
//! on both legs, depth on one leg, or top-of-book only. Strategy selection
//! degrades gracefully under `AutoDetect`; explicitly requested depth
//! strategies reject hard when the book is missing.

pub mod matcher;
pub mod tag;

pub use matcher::{LegMarket, MatchedLevels, MatchingResult, OrderbookMatcher, PairQuote};
pub use tag::{GridTag, TagError};

use serde::{Deserialize, Serialize};

/// Matching strategy: which liquidity signal sizes the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Pick the strongest available signal per leg
    AutoDetect,
    /// Walk price levels on both legs
    DualOrderbook,
    /// Walk price levels on one leg, price the other at its best quote
    SingleOrderbook,
    /// Size both legs from top-of-book only
    BestPrices,
}

/// Direction of the spread trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadDirection {
    /// Buy leg 1, sell leg 2; entered when the spread is low enough
    LongSpread,
    /// Sell leg 1, buy leg 2; entered when the spread is high enough
    ShortSpread,
}

impl SpreadDirection {
    /// Short code used in tag encoding
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::LongSpread => "L",
            Self::ShortSpread => "S",
        }
    }

    /// Parse the tag code
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Self::LongSpread),
            "S" => Some(Self::ShortSpread),
            _ => None,
        }
    }
}
