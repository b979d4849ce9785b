//! Resident market-data views consumed by the matcher
//!
//! Depth snapshots are ordered freshest-first the way feeds deliver them:
//! bids price-descending, asks price-ascending. A snapshot may be partial
//! (top-of-book only) or absent entirely.

use crate::{Px, Qty, Symbol, Ts};
use serde::{Deserialize, Serialize};

/// A resting price level: (price, size)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price
    pub price: Px,
    /// Resting size at this price
    pub size: Qty,
}

impl PriceLevel {
    /// Create a new price level
    #[must_use]
    pub const fn new(price: Px, size: Qty) -> Self {
        Self { price, size }
    }
}

/// Ordered depth snapshot for one instrument
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Bid levels, price descending
    pub bids: Vec<PriceLevel>,
    /// Ask levels, price ascending
    pub asks: Vec<PriceLevel>,
    /// Snapshot timestamp
    pub ts: Ts,
}

impl DepthSnapshot {
    /// Create a snapshot from ordered level vectors
    #[must_use]
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>, ts: Ts) -> Self {
        Self { bids, asks, ts }
    }

    /// Best bid price, if any bids rest
    #[must_use]
    pub fn best_bid(&self) -> Option<Px> {
        self.bids.first().map(|l| l.price)
    }

    /// Best ask price, if any asks rest
    #[must_use]
    pub fn best_ask(&self) -> Option<Px> {
        self.asks.first().map(|l| l.price)
    }

    /// True when at least one level rests on both sides
    #[must_use]
    pub fn has_depth(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    /// Check if book is crossed (bid >= ask)
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => b.as_i64() >= a.as_i64(),
            _ => false,
        }
    }

    /// True when the snapshot is at most `max_age_nanos` old
    ///
    /// Stale depth is dropped at the feed boundary before it becomes
    /// resident; a snapshot from the future counts as fresh.
    #[must_use]
    pub const fn is_fresh(&self, now: Ts, max_age_nanos: u64) -> bool {
        now.as_nanos().saturating_sub(self.ts.as_nanos()) <= max_age_nanos
    }
}

/// Top-of-book quote, the weakest liquidity signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BboQuote {
    /// Best bid price
    pub bid: Px,
    /// Best ask price
    pub ask: Px,
}

impl BboQuote {
    /// Create a new quote
    #[must_use]
    pub const fn new(bid: Px, ask: Px) -> Self {
        Self { bid, ask }
    }

    /// True when both sides carry a usable price
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.bid.as_i64() > 0 && self.ask.as_i64() > 0
    }

    /// Mid price in ticks
    #[must_use]
    pub const fn mid(&self) -> i64 {
        (self.bid.as_i64() + self.ask.as_i64()) / 2
    }
}

/// Fill notification from the transaction layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    /// Originating order ID
    pub order_id: u64,
    /// Filled instrument
    pub symbol: Symbol,
    /// Fill quantity (unsigned; side comes from the originating order)
    pub quantity: Qty,
    /// Fill price
    pub price: Px,
    /// Fill timestamp
    pub ts: Ts,
}
