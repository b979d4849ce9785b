//! Arbitrage execution driver
//!
//! Consumes per-cycle portfolio targets, sizes the outstanding delta
//! against live liquidity through the matcher, and emits tagged child
//! orders through an [`OrderSink`]. Targets are transient; the driver
//! reconstructs everything it needs from the tag, the open-order book and
//! current holdings, so re-invoking it with unchanged targets submits
//! nothing.

pub mod driver;

pub use driver::{CycleOutcome, ExecutionDriver};

use anyhow::Result;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use services_common::{Instrument, Qty, Side};

/// Per-target execution phase, keyed by tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPhase {
    /// No activity yet for this tag
    Idle,
    /// Delta outstanding, waiting for executable liquidity
    Sizing,
    /// Child orders handed to the sink this cycle
    Submitting,
    /// Some quantity open or held, more still wanted
    PartiallyFilled,
    /// Target fully represented by open orders and holdings
    Closed,
}

/// One rebalance-cycle target for an arbitrage pair
///
/// Quantities are absolute desired positions, signed, not deltas. The tag
/// carries the grid context in encoded form; the driver trusts nothing
/// else about where the target came from.
#[derive(Debug, Clone)]
pub struct ArbTarget {
    /// Encoded grid tag identifying the slot
    pub tag: String,
    /// Leg 1 instrument
    pub leg1: Instrument,
    /// Leg 2 instrument
    pub leg2: Instrument,
    /// Absolute signed leg 1 quantity, fixed-point units
    pub leg1_quantity: i64,
    /// Absolute signed leg 2 quantity, fixed-point units
    pub leg2_quantity: i64,
}

/// Child order emitted toward the transaction layer
#[derive(Debug, Clone)]
pub struct ChildOrder {
    /// Instrument to trade
    pub instrument: Instrument,
    /// Order side
    pub side: Side,
    /// Unsigned quantity
    pub quantity: Qty,
    /// Grid tag carried through the venue round trip
    pub tag: String,
}

/// Submission seam toward the transaction layer
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Submit a child order, returning its assigned order ID
    async fn submit(&mut self, order: ChildOrder) -> Result<u64>;
}

/// Signed open-order and held quantity for one tag, per leg
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagExposure {
    /// Signed leg 1 quantity
    pub leg1: i64,
    /// Signed leg 2 quantity
    pub leg2: i64,
}

/// Live open-order quantities per tag
///
/// The driver records its own submissions here, which is what makes
/// repeated invocation idempotent. Fill notifications reduce the open
/// quantity as the exposure migrates into holdings.
#[derive(Debug, Default)]
pub struct OpenOrderBook {
    open: FxHashMap<String, TagExposure>,
}

impl OpenOrderBook {
    /// Create an empty book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open exposure for a tag, zero when unknown
    #[must_use]
    pub fn exposure(&self, tag: &str) -> TagExposure {
        self.open.get(tag).copied().unwrap_or_default()
    }

    /// Record a signed submitted quantity against a tag's leg
    pub fn record(&mut self, tag: &str, leg1_delta: i64, leg2_delta: i64) {
        let entry = self.open.entry(tag.to_string()).or_default();
        entry.leg1 += leg1_delta;
        entry.leg2 += leg2_delta;
    }

    /// Reduce open quantity when a fill moves exposure into holdings
    pub fn apply_fill(&mut self, tag: &str, leg1_filled: i64, leg2_filled: i64) {
        if let Some(entry) = self.open.get_mut(tag) {
            entry.leg1 -= leg1_filled;
            entry.leg2 -= leg2_filled;
            if entry.leg1 == 0 && entry.leg2 == 0 {
                self.open.remove(tag);
            }
        }
    }
}
