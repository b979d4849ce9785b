//! Property-based tests for pair matching invariants
//!
//! Verified properties:
//!
//! - Matched notional never exceeds the requested target
//! - Matched notional is monotone in the target and plateaus once the
//!   thinner book is exhausted
//! - Leg quantities always carry opposite signs
//! - Matching is a pure function: same inputs, same result

use arb_matcher::{LegMarket, MatchStrategy, OrderbookMatcher, PairQuote, SpreadDirection};
use proptest::prelude::*;
use services_common::{BboQuote, DepthSnapshot, PriceLevel, Px, Qty, SCALE_4, Ts};

/// Generate ask levels in ascending price order
fn arb_ask_levels() -> impl Strategy<Value = Vec<PriceLevel>> {
    prop::collection::vec((1i64..1_000, 1i64..10_000), 1..8).prop_map(|raw| {
        let mut price = 0i64;
        raw.into_iter()
            .map(|(step, size)| {
                price += step;
                PriceLevel::new(Px::from_units(price), Qty::from_units(size))
            })
            .collect()
    })
}

/// Generate bid levels in descending price order, starting high enough
/// that every level stays positive
fn arb_bid_levels() -> impl Strategy<Value = Vec<PriceLevel>> {
    prop::collection::vec((1i64..1_000, 1i64..10_000), 1..8).prop_map(|raw| {
        let mut price = 10_000i64 * raw.len() as i64;
        raw.into_iter()
            .map(|(step, size)| {
                price -= step;
                PriceLevel::new(Px::from_units(price), Qty::from_units(size))
            })
            .collect()
    })
}

fn pair_from(asks: Vec<PriceLevel>, bids: Vec<PriceLevel>) -> PairQuote {
    let leg1 = LegMarket::new(
        Some(DepthSnapshot::new(vec![], asks, Ts::from_nanos(1))),
        BboQuote::new(Px::from_units(1), Px::from_units(2)),
    );
    let leg2 = LegMarket::new(
        Some(DepthSnapshot::new(bids, vec![], Ts::from_nanos(1))),
        BboQuote::new(Px::from_units(1), Px::from_units(2)),
    );
    PairQuote {
        leg1,
        leg2,
        direction: SpreadDirection::LongSpread,
        // Threshold wide open so depth, not spread, decides the outcome
        spread_threshold: SCALE_4,
    }
}

proptest! {
    #[test]
    fn matched_notional_never_exceeds_target(
        asks in arb_ask_levels(),
        bids in arb_bid_levels(),
        target_units in 1i64..5_000_000,
    ) {
        let pair = pair_from(asks, bids);
        let target = target_units * SCALE_4;
        let result = OrderbookMatcher::new()
            .match_pair(&pair, target, MatchStrategy::DualOrderbook);
        if result.executable {
            prop_assert!(result.matched_notional() <= target);
        }
    }

    #[test]
    fn matched_notional_is_monotone_in_target(
        asks in arb_ask_levels(),
        bids in arb_bid_levels(),
        target_units in 1i64..1_000_000,
        extra_units in 0i64..1_000_000,
    ) {
        let pair = pair_from(asks, bids);
        let matcher = OrderbookMatcher::new();
        let small = matcher.match_pair(
            &pair, target_units * SCALE_4, MatchStrategy::DualOrderbook);
        let large = matcher.match_pair(
            &pair, (target_units + extra_units) * SCALE_4, MatchStrategy::DualOrderbook);
        if small.executable && large.executable {
            prop_assert!(large.matched_notional() >= small.matched_notional());
        }
    }

    #[test]
    fn matched_notional_plateaus_at_exhaustion(
        asks in arb_ask_levels(),
        bids in arb_bid_levels(),
    ) {
        // A target far beyond total resting notional must produce the same
        // result as an even larger one: the thin book binds, not the target.
        let pair = pair_from(asks, bids);
        let matcher = OrderbookMatcher::new();
        let huge = matcher.match_pair(
            &pair, i64::MAX / (2 * SCALE_4), MatchStrategy::DualOrderbook);
        let huger = matcher.match_pair(
            &pair, i64::MAX / SCALE_4, MatchStrategy::DualOrderbook);
        prop_assert_eq!(huge.matched_notional(), huger.matched_notional());
    }

    #[test]
    fn leg_quantities_carry_opposite_signs(
        asks in arb_ask_levels(),
        bids in arb_bid_levels(),
        target_units in 1i64..1_000_000,
    ) {
        let pair = pair_from(asks, bids);
        let result = OrderbookMatcher::new()
            .match_pair(&pair, target_units * SCALE_4, MatchStrategy::DualOrderbook);
        if result.executable {
            prop_assert!(result.leg1_quantity > 0);
            prop_assert!(result.leg2_quantity < 0);
        }
    }

    #[test]
    fn matching_is_deterministic(
        asks in arb_ask_levels(),
        bids in arb_bid_levels(),
        target_units in 1i64..1_000_000,
    ) {
        let pair = pair_from(asks, bids);
        let matcher = OrderbookMatcher::new();
        let first = matcher.match_pair(
            &pair, target_units * SCALE_4, MatchStrategy::AutoDetect);
        let second = matcher.match_pair(
            &pair, target_units * SCALE_4, MatchStrategy::AutoDetect);
        prop_assert_eq!(first.executable, second.executable);
        prop_assert_eq!(first.leg1_quantity, second.leg1_quantity);
        prop_assert_eq!(first.leg2_quantity, second.leg2_quantity);
    }
}
