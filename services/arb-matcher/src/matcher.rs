//! Pair matching over resident depth
//!
//! All matching is a pure computation over already-resident market data;
//! no live calls happen inside. Buys walk ask levels ascending, sells walk
//! bid levels descending, and the binding constraint in the dual-book case
//! is whichever leg runs out of usable depth first. Every strategy shares
//! the realized-spread post-check computed from the prices actually
//! consumed, not the pre-trade mid.

use crate::{MatchStrategy, SpreadDirection};
use serde::{Deserialize, Serialize};
use services_common::{BboQuote, DepthSnapshot, PriceLevel, Px, Qty, SCALE_4, Side};
use tracing::debug;

/// Market view for one leg: optional depth plus top-of-book
#[derive(Debug, Clone)]
pub struct LegMarket {
    /// Depth snapshot, possibly absent or partial
    pub depth: Option<DepthSnapshot>,
    /// Top-of-book quote, the fallback signal
    pub bbo: BboQuote,
}

impl LegMarket {
    /// Create a leg view
    #[must_use]
    pub fn new(depth: Option<DepthSnapshot>, bbo: BboQuote) -> Self {
        Self { depth, bbo }
    }

    /// Consumable levels for a trade side: buys consume asks, sells bids
    fn levels(&self, trade_side: Side) -> Option<&[PriceLevel]> {
        let snapshot = self.depth.as_ref()?;
        let levels = match trade_side {
            Side::Bid => snapshot.asks.as_slice(),
            Side::Ask => snapshot.bids.as_slice(),
        };
        if levels.is_empty() { None } else { Some(levels) }
    }

    /// True when this leg has at least one usable level for the side
    fn has_depth(&self, trade_side: Side) -> bool {
        self.levels(trade_side).is_some()
    }

    /// Best quote for a trade side: buys lift the ask, sells hit the bid
    fn best(&self, trade_side: Side) -> Px {
        match trade_side {
            Side::Bid => self.bbo.ask,
            Side::Ask => self.bbo.bid,
        }
    }
}

/// Pair of leg views plus the direction and spread requirement
#[derive(Debug, Clone)]
pub struct PairQuote {
    /// Leg 1 market view
    pub leg1: LegMarket,
    /// Leg 2 market view
    pub leg2: LegMarket,
    /// Spread direction being entered
    pub direction: SpreadDirection,
    /// Direction-specific spread threshold, fixed-point (SCALE_4 = 100%)
    pub spread_threshold: i64,
}

/// Price levels consumed on each leg
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchedLevels {
    /// Levels consumed on leg 1
    pub leg1: Vec<PriceLevel>,
    /// Levels consumed on leg 2
    pub leg2: Vec<PriceLevel>,
}

/// Outcome of a match attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingResult {
    /// True when the pair can be executed at the required spread
    pub executable: bool,
    /// The strategy actually used (AutoDetect resolves to a concrete one)
    pub used_strategy: MatchStrategy,
    /// Signed leg 1 quantity in fixed-point units
    pub leg1_quantity: i64,
    /// Signed leg 2 quantity in fixed-point units
    pub leg2_quantity: i64,
    /// Levels consumed per leg
    pub matched_levels: MatchedLevels,
    /// Reason when not executable
    pub reject_reason: Option<String>,
}

impl MatchingResult {
    fn reject(used_strategy: MatchStrategy, reason: impl Into<String>) -> Self {
        Self {
            executable: false,
            used_strategy,
            leg1_quantity: 0,
            leg2_quantity: 0,
            matched_levels: MatchedLevels::default(),
            reject_reason: Some(reason.into()),
        }
    }

    /// Matched notional on leg 1, from consumed levels
    #[must_use]
    pub fn matched_notional(&self) -> i64 {
        self.matched_levels
            .leg1
            .iter()
            .map(|l| l.price.mul_qty(l.size))
            .sum()
    }
}

/// Consumed depth on one leg
struct Walk {
    notional: i64,
    quantity: i64,
    levels: Vec<PriceLevel>,
}

/// Walk levels in book order accumulating size until the notional target
/// is met or depth is exhausted
fn consume(levels: &[PriceLevel], target_notional: i64) -> Walk {
    let mut notional = 0i64;
    let mut quantity = 0i64;
    let mut consumed = Vec::new();

    for level in levels {
        if level.price.as_i64() <= 0 || level.size.as_i64() <= 0 {
            continue;
        }
        let remaining = target_notional - notional;
        let level_notional = level.price.mul_qty(level.size);
        if level_notional >= remaining {
            let partial_qty = (remaining * SCALE_4) / level.price.as_i64();
            if partial_qty > 0 {
                let qty = Qty::from_i64(partial_qty);
                consumed.push(PriceLevel::new(level.price, qty));
                quantity += partial_qty;
                notional += level.price.mul_qty(qty);
            }
            break;
        }
        consumed.push(*level);
        quantity += level.size.as_i64();
        notional += level_notional;
    }

    Walk {
        notional,
        quantity,
        levels: consumed,
    }
}

/// Orderbook arbitrage matcher
#[derive(Debug, Default)]
pub struct OrderbookMatcher;

impl OrderbookMatcher {
    /// Create a matcher
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute the maximum jointly-executable paired quantity for a
    /// notional target
    ///
    /// Explicitly requested depth strategies reject hard when the book is
    /// missing; only `AutoDetect` falls back.
    #[must_use]
    pub fn match_pair(
        &self,
        pair: &PairQuote,
        target_notional: i64,
        strategy: MatchStrategy,
    ) -> MatchingResult {
        if target_notional <= 0 {
            return MatchingResult::reject(strategy, "Target notional must be positive");
        }
        let (side1, side2) = trade_sides(pair.direction);

        let resolved = match strategy {
            MatchStrategy::AutoDetect => {
                let d1 = pair.leg1.has_depth(side1);
                let d2 = pair.leg2.has_depth(side2);
                let chosen = if d1 && d2 {
                    MatchStrategy::DualOrderbook
                } else if d1 || d2 {
                    MatchStrategy::SingleOrderbook
                } else {
                    MatchStrategy::BestPrices
                };
                debug!(?chosen, leg1_depth = d1, leg2_depth = d2, "auto-detected strategy");
                chosen
            }
            explicit => explicit,
        };

        match resolved {
            MatchStrategy::DualOrderbook => self.match_dual(pair, target_notional, side1, side2),
            MatchStrategy::SingleOrderbook => {
                self.match_single(pair, target_notional, side1, side2)
            }
            MatchStrategy::BestPrices => self.match_best(pair, target_notional, side1, side2),
            MatchStrategy::AutoDetect => unreachable!("auto-detect resolved above"),
        }
    }

    fn match_dual(
        &self,
        pair: &PairQuote,
        target_notional: i64,
        side1: Side,
        side2: Side,
    ) -> MatchingResult {
        let Some(levels1) = pair.leg1.levels(side1) else {
            return MatchingResult::reject(
                MatchStrategy::DualOrderbook,
                "Leg 1 orderbook unavailable",
            );
        };
        let Some(levels2) = pair.leg2.levels(side2) else {
            return MatchingResult::reject(
                MatchStrategy::DualOrderbook,
                "Leg 2 orderbook unavailable",
            );
        };

        // Walk each leg independently; the binding constraint is whichever
        // leg runs out of usable depth first. On an exact tie both legs
        // exhaust together and leg 1's notional is taken.
        let walk1 = consume(levels1, target_notional);
        let walk2 = consume(levels2, target_notional);
        let binding = walk1.notional.min(walk2.notional);
        if binding <= 0 {
            return MatchingResult::reject(
                MatchStrategy::DualOrderbook,
                "No usable depth in either orderbook",
            );
        }

        // Re-consume both legs to the binding notional so executable
        // notional is equal on both sides.
        let filled1 = consume(levels1, binding);
        let filled2 = consume(levels2, binding);
        finish(MatchStrategy::DualOrderbook, pair, filled1, filled2)
    }

    fn match_single(
        &self,
        pair: &PairQuote,
        target_notional: i64,
        side1: Side,
        side2: Side,
    ) -> MatchingResult {
        // The deep leg is walked; the other is sized at its best quote.
        // With both books present leg 1 is walked, deterministically.
        let (deep_first, deep_levels, flat_leg, flat_side) =
            if pair.leg1.has_depth(side1) {
                (true, pair.leg1.levels(side1), &pair.leg2, side2)
            } else if pair.leg2.has_depth(side2) {
                (false, pair.leg2.levels(side2), &pair.leg1, side1)
            } else {
                return MatchingResult::reject(
                    MatchStrategy::SingleOrderbook,
                    "Neither leg has an orderbook",
                );
            };
        let walk = consume(deep_levels.unwrap_or(&[]), target_notional);
        if walk.notional <= 0 {
            return MatchingResult::reject(
                MatchStrategy::SingleOrderbook,
                "No usable depth in the walked orderbook",
            );
        }

        let flat_price = flat_leg.best(flat_side);
        if flat_price.as_i64() <= 0 {
            return MatchingResult::reject(
                MatchStrategy::SingleOrderbook,
                "Best quote unavailable for the quote-priced leg",
            );
        }
        let flat_qty = (walk.notional * SCALE_4) / flat_price.as_i64();
        let flat = Walk {
            notional: walk.notional,
            quantity: flat_qty,
            levels: vec![PriceLevel::new(flat_price, Qty::from_i64(flat_qty))],
        };

        if deep_first {
            finish(MatchStrategy::SingleOrderbook, pair, walk, flat)
        } else {
            finish(MatchStrategy::SingleOrderbook, pair, flat, walk)
        }
    }

    fn match_best(
        &self,
        pair: &PairQuote,
        target_notional: i64,
        side1: Side,
        side2: Side,
    ) -> MatchingResult {
        let price1 = pair.leg1.best(side1);
        let price2 = pair.leg2.best(side2);
        if price1.as_i64() <= 0 || price2.as_i64() <= 0 {
            return MatchingResult::reject(
                MatchStrategy::BestPrices,
                "Best bid/ask unavailable on a leg",
            );
        }

        let qty1 = (target_notional * SCALE_4) / price1.as_i64();
        let qty2 = (target_notional * SCALE_4) / price2.as_i64();
        let walk1 = Walk {
            notional: target_notional,
            quantity: qty1,
            levels: vec![PriceLevel::new(price1, Qty::from_i64(qty1))],
        };
        let walk2 = Walk {
            notional: target_notional,
            quantity: qty2,
            levels: vec![PriceLevel::new(price2, Qty::from_i64(qty2))],
        };
        finish(MatchStrategy::BestPrices, pair, walk1, walk2)
    }
}

/// Trade sides per direction: long spread buys leg 1 and sells leg 2
const fn trade_sides(direction: SpreadDirection) -> (Side, Side) {
    match direction {
        SpreadDirection::LongSpread => (Side::Bid, Side::Ask),
        SpreadDirection::ShortSpread => (Side::Ask, Side::Bid),
    }
}

/// Shared post-check and result assembly: realized spread from the prices
/// actually consumed must satisfy the direction-specific threshold
fn finish(
    used_strategy: MatchStrategy,
    pair: &PairQuote,
    walk1: Walk,
    walk2: Walk,
) -> MatchingResult {
    if walk1.quantity <= 0 || walk2.quantity <= 0 {
        return MatchingResult::reject(used_strategy, "Matched quantity is zero");
    }
    // VWAP of consumed levels per leg
    let price1 = (walk1.notional * SCALE_4) / walk1.quantity;
    let price2 = (walk2.notional * SCALE_4) / walk2.quantity;
    let realized_spread = ((price1 - price2) * SCALE_4) / price1;

    let spread_ok = match pair.direction {
        SpreadDirection::LongSpread => realized_spread <= pair.spread_threshold,
        SpreadDirection::ShortSpread => realized_spread >= pair.spread_threshold,
    };

    let (sign1, sign2) = match pair.direction {
        SpreadDirection::LongSpread => (1, -1),
        SpreadDirection::ShortSpread => (-1, 1),
    };
    let matched_levels = MatchedLevels {
        leg1: walk1.levels,
        leg2: walk2.levels,
    };

    if spread_ok {
        MatchingResult {
            executable: true,
            used_strategy,
            leg1_quantity: sign1 * walk1.quantity,
            leg2_quantity: sign2 * walk2.quantity,
            matched_levels,
            reject_reason: None,
        }
    } else {
        MatchingResult {
            executable: false,
            used_strategy,
            leg1_quantity: sign1 * walk1.quantity,
            leg2_quantity: sign2 * walk2.quantity,
            matched_levels,
            reject_reason: Some(format!(
                "Spread insufficient: realized {realized_spread} vs threshold {}",
                pair.spread_threshold
            )),
        }
    }
}
