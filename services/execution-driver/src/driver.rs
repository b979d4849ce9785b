//! Delta-based child order emission
//!
//! Each cycle the driver computes, per target, the delta between the
//! absolute desired quantity and what is already represented by open
//! orders plus holdings, sizes that delta through the matcher, and
//! submits child orders for the matched portion only. Submissions are
//! recorded in the open-order book before returning, so a second cycle
//! with unchanged targets computes a zero delta and submits nothing.

use crate::{ArbTarget, ChildOrder, OpenOrderBook, OrderSink, TagExposure, TargetPhase};
use anyhow::Result;
use arb_matcher::{
    GridTag, LegMarket, MatchStrategy, OrderbookMatcher, PairQuote, SpreadDirection,
};
use rustc_hash::FxHashMap;
use services_common::{Qty, Side};
use tracing::{debug, info, warn};

/// Outcome of one drive cycle for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Target skipped, typically on a malformed tag
    Skipped {
        /// Why the target was not acted on
        reason: String,
    },
    /// Nothing outstanding; open orders and holdings cover the target
    AlreadyComplete,
    /// Matcher found no executable quantity this cycle
    NotExecutable {
        /// Matcher rejection reason
        reason: String,
    },
    /// Child orders were handed to the sink
    Submitted {
        /// Sink-assigned order IDs, one per submitted leg
        order_ids: Vec<u64>,
    },
}

/// Per-tag arbitrage execution driver
pub struct ExecutionDriver<S: OrderSink> {
    sink: S,
    matcher: OrderbookMatcher,
    phases: FxHashMap<String, TargetPhase>,
}

impl<S: OrderSink> ExecutionDriver<S> {
    /// Create a driver around a submission sink
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            matcher: OrderbookMatcher::new(),
            phases: FxHashMap::default(),
        }
    }

    /// Current phase for a tag
    #[must_use]
    pub fn phase(&self, tag: &str) -> TargetPhase {
        self.phases.get(tag).copied().unwrap_or(TargetPhase::Idle)
    }

    /// Drive one target for one cycle
    ///
    /// `held` is the signed holdings already attributed to this tag;
    /// `open` carries live open-order exposure and receives this cycle's
    /// submissions.
    pub async fn drive(
        &mut self,
        target: &ArbTarget,
        leg1_market: &LegMarket,
        leg2_market: &LegMarket,
        open: &mut OpenOrderBook,
        held: TagExposure,
    ) -> Result<CycleOutcome> {
        let grid = match GridTag::decode(&target.tag) {
            Ok(grid) => grid,
            Err(err) => {
                warn!(tag = %target.tag, %err, "skipping target with undecodable tag");
                return Ok(CycleOutcome::Skipped {
                    reason: err.to_string(),
                });
            }
        };

        let exposure = open.exposure(&target.tag);
        let delta1 = target.leg1_quantity - (exposure.leg1 + held.leg1);
        let delta2 = target.leg2_quantity - (exposure.leg2 + held.leg2);
        if delta1 == 0 && delta2 == 0 {
            self.phases.insert(target.tag.clone(), TargetPhase::Closed);
            debug!(tag = %target.tag, "target fully represented, nothing to submit");
            return Ok(CycleOutcome::AlreadyComplete);
        }
        self.phases.insert(target.tag.clone(), TargetPhase::Sizing);

        let pair = PairQuote {
            leg1: leg1_market.clone(),
            leg2: leg2_market.clone(),
            direction: grid.direction,
            spread_threshold: grid.entry_spread,
        };
        let target_notional = sizing_notional(&pair, delta1);
        if target_notional <= 0 {
            return Ok(CycleOutcome::NotExecutable {
                reason: "No reference price to size the outstanding delta".to_string(),
            });
        }

        let result = self
            .matcher
            .match_pair(&pair, target_notional, MatchStrategy::AutoDetect);
        if !result.executable {
            let reason = result
                .reject_reason
                .unwrap_or_else(|| "not executable".to_string());
            debug!(tag = %target.tag, %reason, "match rejected, retry next cycle");
            return Ok(CycleOutcome::NotExecutable { reason });
        }

        // Submit only the matched portion of the delta, never more than the
        // delta itself.
        let submit1 = clamp_to_delta(result.leg1_quantity, delta1);
        let submit2 = clamp_to_delta(result.leg2_quantity, delta2);
        if submit1 == 0 && submit2 == 0 {
            return Ok(CycleOutcome::NotExecutable {
                reason: "Matched quantity rounds to zero against the delta".to_string(),
            });
        }
        self.phases
            .insert(target.tag.clone(), TargetPhase::Submitting);

        let mut order_ids = Vec::new();
        if submit1 != 0 {
            let id = self
                .sink
                .submit(child_order(&target.leg1, submit1, &target.tag))
                .await?;
            order_ids.push(id);
        }
        if submit2 != 0 {
            let id = self
                .sink
                .submit(child_order(&target.leg2, submit2, &target.tag))
                .await?;
            order_ids.push(id);
        }
        open.record(&target.tag, submit1, submit2);

        let remaining = (delta1 - submit1, delta2 - submit2);
        let phase = if remaining == (0, 0) {
            TargetPhase::Submitting
        } else {
            TargetPhase::PartiallyFilled
        };
        self.phases.insert(target.tag.clone(), phase);
        info!(
            tag = %target.tag,
            leg1 = submit1,
            leg2 = submit2,
            strategy = ?result.used_strategy,
            "submitted child orders"
        );
        Ok(CycleOutcome::Submitted { order_ids })
    }
}

/// Notional for sizing leg 1's outstanding delta at its trade-side quote
fn sizing_notional(pair: &PairQuote, delta1: i64) -> i64 {
    let price = match pair.direction {
        SpreadDirection::LongSpread => pair.leg1.bbo.ask,
        SpreadDirection::ShortSpread => pair.leg1.bbo.bid,
    };
    price.mul_qty(Qty::from_i64(delta1.abs()))
}

/// Clamp a matched signed quantity to the outstanding delta
///
/// The submitted quantity takes the delta's sign; a matched quantity
/// pointing the other way contributes nothing.
fn clamp_to_delta(matched: i64, delta: i64) -> i64 {
    if delta == 0 || matched.signum() != delta.signum() {
        return 0;
    }
    matched.signum() * matched.abs().min(delta.abs())
}

fn child_order(instrument: &services_common::Instrument, signed_qty: i64, tag: &str) -> ChildOrder {
    let side = if signed_qty > 0 { Side::Bid } else { Side::Ask };
    ChildOrder {
        instrument: instrument.clone(),
        side,
        quantity: Qty::from_i64(signed_qty.abs()),
        tag: tag.to_string(),
    }
}
