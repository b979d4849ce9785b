//! Strategy selection and degradation tests
//!
//! AutoDetect falls back gracefully as liquidity signals disappear;
//! explicitly requested depth strategies never do.

use arb_matcher::{
    LegMarket, MatchStrategy, OrderbookMatcher, PairQuote, SpreadDirection,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use services_common::{BboQuote, DepthSnapshot, PriceLevel, Px, Qty, SCALE_4, Ts};

fn with_depth() -> LegMarket {
    let bid = PriceLevel::new(Px::from_units(99), Qty::from_units(10));
    let ask = PriceLevel::new(Px::from_units(100), Qty::from_units(10));
    LegMarket::new(
        Some(DepthSnapshot::new(vec![bid], vec![ask], Ts::from_nanos(1))),
        BboQuote::new(Px::from_units(99), Px::from_units(100)),
    )
}

fn quotes_only() -> LegMarket {
    LegMarket::new(None, BboQuote::new(Px::from_units(99), Px::from_units(100)))
}

fn pair(leg1: LegMarket, leg2: LegMarket) -> PairQuote {
    PairQuote {
        leg1,
        leg2,
        direction: SpreadDirection::LongSpread,
        // Threshold wide open so liquidity, not spread, decides
        spread_threshold: SCALE_4,
    }
}

#[rstest]
#[case::both_deep(with_depth(), with_depth(), MatchStrategy::DualOrderbook)]
#[case::only_leg1_deep(with_depth(), quotes_only(), MatchStrategy::SingleOrderbook)]
#[case::only_leg2_deep(quotes_only(), with_depth(), MatchStrategy::SingleOrderbook)]
#[case::neither_deep(quotes_only(), quotes_only(), MatchStrategy::BestPrices)]
fn test_auto_detect_degrades_gracefully(
    #[case] leg1: LegMarket,
    #[case] leg2: LegMarket,
    #[case] expected: MatchStrategy,
) {
    let result = OrderbookMatcher::new().match_pair(
        &pair(leg1, leg2),
        100 * SCALE_4,
        MatchStrategy::AutoDetect,
    );
    assert_eq!(result.used_strategy, expected);
    assert!(result.executable, "{:?}", result.reject_reason);
}

#[rstest]
#[case::dual_missing_leg2(MatchStrategy::DualOrderbook, with_depth(), quotes_only())]
#[case::dual_missing_both(MatchStrategy::DualOrderbook, quotes_only(), quotes_only())]
#[case::single_missing_both(MatchStrategy::SingleOrderbook, quotes_only(), quotes_only())]
fn test_explicit_depth_strategy_rejects_hard(
    #[case] strategy: MatchStrategy,
    #[case] leg1: LegMarket,
    #[case] leg2: LegMarket,
) {
    let result =
        OrderbookMatcher::new().match_pair(&pair(leg1, leg2), 100 * SCALE_4, strategy);
    assert!(!result.executable);
    let reason = result.reject_reason.expect("rejection carries a reason");
    assert!(reason.contains("orderbook"), "unexpected reason: {reason}");
}
