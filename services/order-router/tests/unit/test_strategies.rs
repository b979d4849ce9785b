//! Cross-strategy routing tests
//!
//! Exercises the full configuration-to-routing path for every strategy
//! type and the properties callers depend on: purity across instances,
//! case-insensitive market matching and default fallback.

use order_router::RouterConfig;
use pretty_assertions::assert_eq;
use rstest::rstest;
use services_common::{Instrument, InstrumentKind, OrderTicket, Qty, Side, Symbol};

fn ticket(market: &str, kind: InstrumentKind, ticker: &str) -> OrderTicket {
    OrderTicket {
        order_id: 7,
        instrument: Instrument::new(Symbol::new(7), ticker, market, kind, "USD"),
        side: Side::Bid,
        quantity: Qty::from_units(1),
        limit_price: None,
        tag: String::new(),
    }
}

fn config(kind: &str, mappings: &[(&str, &str)]) -> RouterConfig {
    let mappings_json: String = mappings
        .iter()
        .map(|(k, v)| format!(r#""{k}": "{v}""#))
        .collect::<Vec<_>>()
        .join(", ");
    let doc = format!(
        r#"{{
            "accounts": {{"IBKR": 5000000000, "Kraken": 5000000000, "Deribit": 5000000000}},
            "router": {{
                "type": "{kind}",
                "mappings": {{{mappings_json}}},
                "default": "IBKR"
            }}
        }}"#
    );
    RouterConfig::from_json(&doc).unwrap()
}

#[rstest]
#[case::market_exact("market", &[("USA", "IBKR"), ("Kraken", "Kraken")], ticket("Kraken", InstrumentKind::Spot, "BTCUSD"), "Kraken")]
#[case::market_case_folded("market", &[("USA", "IBKR"), ("Kraken", "Kraken")], ticket("kraken", InstrumentKind::Spot, "BTCUSD"), "Kraken")]
#[case::market_default_fallback("market", &[("USA", "IBKR"), ("Kraken", "Kraken")], ticket("FXCM", InstrumentKind::Forex, "EURUSD"), "IBKR")]
#[case::kind_match("security_type", &[("perpetual", "Deribit")], ticket("Deribit", InstrumentKind::Perpetual, "BTC-PERP"), "Deribit")]
#[case::kind_fallback("security_type", &[("perpetual", "Deribit")], ticket("USA", InstrumentKind::Equity, "SPY"), "IBKR")]
#[case::ticker_match("symbol", &[("BTCUSD", "Kraken")], ticket("Kraken", InstrumentKind::Spot, "BTCUSD"), "Kraken")]
#[case::ticker_is_exact("symbol", &[("BTCUSD", "Kraken")], ticket("Kraken", InstrumentKind::Spot, "btcusd"), "IBKR")]
#[case::fixed_default("default", &[], ticket("Anywhere", InstrumentKind::Spot, "X"), "IBKR")]
fn test_configured_routing(
    #[case] kind: &str,
    #[case] mappings: &[(&str, &str)],
    #[case] order: OrderTicket,
    #[case] expected: &str,
) {
    let router = config(kind, mappings).build().unwrap();
    assert_eq!(router.route(&order), expected);
}

#[rstest]
#[case::market("market")]
#[case::security_type("security_type")]
#[case::symbol("symbol")]
fn test_routing_is_pure_across_instances(#[case] kind: &str) {
    let mappings: &[(&str, &str)] = match kind {
        "market" => &[("USA", "IBKR")],
        "security_type" => &[("spot", "Kraken")],
        _ => &[("SPY", "IBKR")],
    };
    let a = config(kind, mappings).build().unwrap();
    let b = config(kind, mappings).build().unwrap();

    let orders = [
        ticket("USA", InstrumentKind::Equity, "SPY"),
        ticket("Kraken", InstrumentKind::Spot, "BTCUSD"),
        ticket("FXCM", InstrumentKind::Forex, "EURUSD"),
    ];
    for order in &orders {
        for _ in 0..3 {
            assert_eq!(a.route(order), b.route(order));
        }
    }
}

#[rstest]
fn test_all_built_strategies_validate(
    #[values("market", "security_type", "symbol", "default")] kind: &str,
) {
    let mappings: &[(&str, &str)] = match kind {
        "market" => &[("USA", "IBKR")],
        "security_type" => &[("spot", "Kraken")],
        "symbol" => &[("SPY", "IBKR")],
        _ => &[],
    };
    let router = config(kind, mappings).build().unwrap();
    assert!(router.validate(), "{} should validate", router.name());
}
