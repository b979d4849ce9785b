//! Multi-currency reconciliation scenarios
//!
//! End-to-end flows across the manager, coordinator and ledgers: accounts
//! settling in different base currencies, conversion rates arriving after
//! the currencies they cover, and the aggregate fold staying consistent
//! throughout.

use order_router::RouterConfig;
use portfolio_manager::{ConversionCoordinator, MultiAccountManager};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use rustc_hash::{FxHashMap, FxHashSet};
use services_common::SCALE_4;

const CONFIG_DOC: &str = r#"{
    "accounts": {"IBKR": 500000000, "Kraken": 500000000},
    "router": {
        "type": "market",
        "mappings": {"USA": "IBKR", "Kraken": "Kraken"},
        "default": "IBKR"
    }
}"#;

#[fixture]
fn manager() -> MultiAccountManager {
    let config = RouterConfig::from_json(CONFIG_DOC).unwrap();
    let pegged: FxHashSet<String> = ["USDC".to_string()].into_iter().collect();
    let mut overrides = FxHashMap::default();
    overrides.insert("Kraken".to_string(), "USDC".to_string());
    MultiAccountManager::from_config(
        &config,
        ConversionCoordinator::new("USD", pegged),
        &overrides,
    )
    .unwrap()
}

#[rstest]
fn test_per_account_base_currencies(manager: MultiAccountManager) {
    assert_eq!(manager.get_account("IBKR").unwrap().base_currency(), "USD");
    // The override keeps the stablecoin account settling in its own
    // currency instead of silently defaulting to USD
    assert_eq!(manager.get_account("Kraken").unwrap().base_currency(), "USDC");
}

#[rstest]
fn test_late_conversion_rate_defers_then_completes(mut manager: MultiAccountManager) {
    let euros = 10_000 * SCALE_4;

    // Before any foreign currency appears, the sync is already complete
    let (outcome, created) = manager.resync_conversions();
    assert!(outcome.complete);
    assert!(created.is_empty());

    // A EUR balance appears before any conversion subscription exists
    manager.get_account_mut("IBKR").unwrap().deposit("EUR", euros);

    let (outcome, created) = manager.resync_conversions();
    assert!(!outcome.complete);
    assert_eq!(outcome.deferred, vec!["EUR".to_string()]);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].pair(), "EURUSD");

    // The EUR balance is visible but values at zero until the rate lands
    assert_eq!(manager.aggregate().cash_balance("EUR"), Some(euros));
    assert_eq!(
        manager.get_account("IBKR").unwrap().total_cash(),
        50_000 * SCALE_4
    );

    // Rate initializes; the re-triggered sync completes
    created[0].set_rate(11_000); // 1.10
    let (outcome, created_again) = manager.resync_conversions();
    assert!(outcome.complete);
    assert!(created_again.is_empty());

    let view = manager.ledger_view();
    assert_eq!(view.balance("EUR").unwrap(), euros);
    // 10,000 EUR at 1.10 contributes 11,000 USD to total cash
    assert_eq!(
        manager.get_account("IBKR").unwrap().total_cash(),
        (50_000 + 11_000) * SCALE_4
    );
}

#[rstest]
fn test_pegged_currency_needs_no_subscription(mut manager: MultiAccountManager) {
    let (outcome, created) = manager.resync_conversions();
    assert!(outcome.complete);
    // The USDC account's base entry and the aggregate's pegged entry never
    // ask for a live subscription
    assert!(created.is_empty());
    assert_eq!(
        manager.aggregate().cash_balance("USDC"),
        Some(50_000 * SCALE_4)
    );
    assert_eq!(
        manager.aggregate().cash_balance("USD"),
        Some(50_000 * SCALE_4)
    );
}

#[rstest]
fn test_foreign_base_currency_gets_aggregate_subscription() {
    // An EUR-settled account under a USD aggregate: the EUR entry is the
    // account's own base, so no sub-account handle exists for it. The
    // resync must still create the subscription at the aggregate level.
    let config = RouterConfig::from_json(CONFIG_DOC).unwrap();
    let mut overrides = FxHashMap::default();
    overrides.insert("Kraken".to_string(), "EUR".to_string());
    let mut manager = MultiAccountManager::from_config(
        &config,
        ConversionCoordinator::new("USD", FxHashSet::default()),
        &overrides,
    )
    .unwrap();

    let (outcome, created) = manager.resync_conversions();
    assert!(!outcome.complete);
    assert_eq!(outcome.deferred, vec!["EUR".to_string()]);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].pair(), "EURUSD");

    // A second pass without a rate defers again but creates nothing new
    let (outcome, created_again) = manager.resync_conversions();
    assert!(!outcome.complete);
    assert!(created_again.is_empty());

    // Once the subscription publishes, the re-sync completes and the EUR
    // balance becomes visible in the aggregate
    created[0].set_rate(11_000); // 1.10
    let (outcome, _) = manager.resync_conversions();
    assert!(outcome.complete);
    assert_eq!(
        manager.aggregate().total_cash(),
        (50_000 + 55_000) * SCALE_4
    );
}

#[rstest]
fn test_repeated_resync_is_stable(mut manager: MultiAccountManager) {
    for _ in 0..3 {
        let (outcome, _) = manager.resync_conversions();
        assert!(outcome.complete);
    }
    let sub_sum: i64 = manager.accounts().map(|l| l.total_cash()).sum();
    assert_eq!(manager.aggregate().total_cash(), sub_sum);
}
