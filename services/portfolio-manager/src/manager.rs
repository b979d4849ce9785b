//! Multi-account portfolio manager
//!
//! Owns the sub-account ledgers, the order router and the aggregate view.
//! Instruments are routed once at addition time and fills are forwarded via
//! the order's original routing decision. Aggregate value/margin/cash are
//! sums over the sub-accounts computed per call - fills are never replayed
//! into the aggregate ledger, so portfolio value cannot silently double.

use crate::conversion::{ConversionCoordinator, ConversionHandle, SyncOutcome};
use crate::error::PortfolioError;
use crate::ledger::{CashEntry, SubAccountLedger};
use crate::view::RoutingLedgerView;
use order_router::{OrderRouter, RouterConfig, RouterError};
use rustc_hash::FxHashMap;
use services_common::{Fill, Instrument, OrderTicket, Qty, Side, Symbol};
use tracing::{debug, info, warn};

/// Multi-account portfolio manager
pub struct MultiAccountManager {
    accounts: FxHashMap<String, SubAccountLedger>,
    aggregate: SubAccountLedger,
    router: Box<dyn OrderRouter>,
    coordinator: ConversionCoordinator,
    /// Instrument -> owning account, recorded at addition time
    instrument_owner: FxHashMap<Symbol, String>,
    /// Order -> account, recorded when the order was routed
    order_routes: FxHashMap<u64, String>,
    /// Order -> side, needed to sign the fill quantity
    order_sides: FxHashMap<u64, Side>,
}

impl MultiAccountManager {
    /// Build the manager from the setup configuration document
    ///
    /// Fails fast on an empty account map, an unusable router, or an empty
    /// default account (configuration errors abort startup).
    pub fn from_config(
        config: &RouterConfig,
        coordinator: ConversionCoordinator,
        base_currency_overrides: &FxHashMap<String, String>,
    ) -> Result<Self, PortfolioError> {
        let router = config.build()?;
        if !router.validate() {
            return Err(PortfolioError::Router(RouterError::InvalidConfiguration {
                reason: format!("router '{}' failed validation", router.name()),
            }));
        }

        let settlement = coordinator.settlement_currency().to_string();
        let mut accounts = FxHashMap::default();
        for (name, initial_cash) in &config.accounts {
            let base = base_currency_overrides
                .get(name)
                .map_or(settlement.as_str(), String::as_str);
            accounts.insert(
                name.clone(),
                SubAccountLedger::new(name.clone(), base, *initial_cash),
            );
        }
        info!(
            accounts = accounts.len(),
            router = router.name(),
            "multi-account portfolio initialized"
        );

        Ok(Self::assemble(accounts, router, coordinator))
    }

    /// Assemble a manager from already-built parts (tests, custom setups)
    #[must_use]
    pub fn assemble(
        accounts: FxHashMap<String, SubAccountLedger>,
        router: Box<dyn OrderRouter>,
        coordinator: ConversionCoordinator,
    ) -> Self {
        let aggregate =
            SubAccountLedger::derived("aggregate", coordinator.settlement_currency());
        Self {
            accounts,
            aggregate,
            router,
            coordinator,
            instrument_owner: FxHashMap::default(),
            order_routes: FxHashMap::default(),
            order_sides: FxHashMap::default(),
        }
    }

    /// Read access to the routing strategy
    #[must_use]
    pub fn router(&self) -> &dyn OrderRouter {
        self.router.as_ref()
    }

    /// The derived aggregate ledger
    #[must_use]
    pub fn aggregate(&self) -> &SubAccountLedger {
        &self.aggregate
    }

    /// Route a newly-observed instrument to its owning account and insert
    /// it into that sub-account's ledger only
    ///
    /// A router answer naming no configured account is a
    /// configuration-integrity failure: logged and skipped so the other
    /// accounts keep operating.
    pub fn add_instrument(&mut self, instrument: Instrument) {
        if self.instrument_owner.contains_key(&instrument.symbol) {
            debug!(instrument = %instrument, "instrument already owned, skipped");
            return;
        }
        let account = self.router.route(&probe_ticket(&instrument)).to_string();
        let Some(ledger) = self.accounts.get_mut(&account) else {
            warn!(
                account = %account,
                instrument = %instrument,
                "router returned account with no matching sub-account, \
                 instrument not placed"
            );
            return;
        };
        let symbol = instrument.symbol;
        ledger.add_instrument(instrument);
        self.instrument_owner.insert(symbol, account);
    }

    /// Record the routing decision for an order about to be submitted
    ///
    /// Fills for this order are later forwarded to the account resolved
    /// here, not re-derived from the fill alone.
    pub fn record_order(&mut self, order: &OrderTicket) -> Result<String, PortfolioError> {
        let account = self.router.route(order).to_string();
        if !self.accounts.contains_key(&account) {
            return Err(PortfolioError::UnknownAccount { name: account });
        }
        self.order_routes.insert(order.order_id, account.clone());
        self.order_sides.insert(order.order_id, order.side);
        Ok(account)
    }

    /// Forward a fill exclusively to the owning sub-account ledger
    ///
    /// The aggregate is never mutated here; its totals are derived sums,
    /// and applying the fill twice would silently double portfolio value.
    pub fn process_fill(&mut self, fill: &Fill) {
        let Some(account) = self.order_routes.get(&fill.order_id) else {
            warn!(
                order_id = fill.order_id,
                "fill for unrecorded order, skipped"
            );
            return;
        };
        let side = self
            .order_sides
            .get(&fill.order_id)
            .copied()
            .unwrap_or(Side::Bid);
        let Some(ledger) = self.accounts.get_mut(account) else {
            warn!(
                account = %account,
                order_id = fill.order_id,
                "recorded account has no matching sub-account, fill skipped"
            );
            return;
        };
        ledger.process_fill(side, fill);
    }

    /// Total portfolio value: sum over sub-accounts, recomputed per call
    #[must_use]
    pub fn total_value(&self) -> i64 {
        self.accounts.values().map(SubAccountLedger::total_value).sum()
    }

    /// Total margin used across sub-accounts, recomputed per call
    #[must_use]
    pub fn total_margin_used(&self) -> i64 {
        self.accounts.values().map(SubAccountLedger::margin_used).sum()
    }

    /// Total cash across sub-accounts, recomputed per call
    #[must_use]
    pub fn total_cash(&self) -> i64 {
        self.accounts.values().map(SubAccountLedger::total_cash).sum()
    }

    /// Sub-account ledger by name
    pub fn get_account(&self, name: &str) -> Result<&SubAccountLedger, PortfolioError> {
        self.accounts
            .get(name)
            .ok_or_else(|| PortfolioError::UnknownAccount {
                name: name.to_string(),
            })
    }

    /// Mutable sub-account ledger by name, for cash movements originating
    /// outside the fill path (deposits, withdrawals, funding)
    pub fn get_account_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut SubAccountLedger, PortfolioError> {
        self.accounts
            .get_mut(name)
            .ok_or_else(|| PortfolioError::UnknownAccount {
                name: name.to_string(),
            })
    }

    /// Currency table of a sub-account
    pub fn get_account_cash_book(
        &self,
        name: &str,
    ) -> Result<&FxHashMap<String, CashEntry>, PortfolioError> {
        self.get_account(name).map(SubAccountLedger::cash_book)
    }

    /// Iterate the sub-account ledgers
    pub fn accounts(&self) -> impl Iterator<Item = &SubAccountLedger> {
        self.accounts.values()
    }

    /// Owning account of an instrument, if it has been placed
    #[must_use]
    pub fn instrument_owner(&self, symbol: Symbol) -> Option<&str> {
        self.instrument_owner.get(&symbol).map(String::as_str)
    }

    /// Check a batch of orders against per-account buying power
    ///
    /// Orders in one batch may belong to different accounts, so each order
    /// is routed individually; the check fails fast on the first account
    /// whose accumulated requirement exceeds its buying power.
    pub fn has_sufficient_buying_power(
        &self,
        orders: &[OrderTicket],
    ) -> Result<(), PortfolioError> {
        let mut required: FxHashMap<&str, i64> = FxHashMap::default();
        for order in orders {
            let account = self.router.route(order);
            let ledger = self.accounts.get(account).ok_or_else(|| {
                PortfolioError::UnknownAccount {
                    name: account.to_string(),
                }
            })?;
            let needed = required.entry(account).or_insert(0);
            *needed += order.notional();
            let available = ledger.buying_power();
            if *needed > available {
                return Err(PortfolioError::InsufficientBuyingPower {
                    account: account.to_string(),
                    required: *needed,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Run the conversion reconciliation pass
    ///
    /// Registers missing conversion handles per sub-account (in each
    /// account's own base currency) and folds all balances into the
    /// aggregate. Safe to invoke before conversion rates exist; the
    /// outcome reports currencies still deferred so the engine re-triggers
    /// the sync on the next initialization event instead of trusting event
    /// order.
    pub fn resync_conversions(&mut self) -> (SyncOutcome, Vec<ConversionHandle>) {
        let mut created = Vec::new();
        for ledger in self.accounts.values_mut() {
            created.extend(self.coordinator.ensure_conversions(ledger));
        }
        let subs: Vec<&SubAccountLedger> = self.accounts.values().collect();
        let outcome = self.coordinator.sync_aggregate(&mut self.aggregate, &subs);
        // An account's own base currency never gets a handle in its own
        // ledger, so a foreign-settled sub-account (say EUR under a USD
        // aggregate) surfaces here as an aggregate entry with no conversion.
        // Registering over the aggregate creates the pending subscription
        // that lets a later re-sync complete instead of deferring forever.
        created.extend(self.coordinator.ensure_conversions(&mut self.aggregate));
        (outcome, created)
    }

    /// Read-only currency resolution across aggregate and sub-accounts
    #[must_use]
    pub fn ledger_view(&self) -> RoutingLedgerView<'_> {
        RoutingLedgerView::new(&self.aggregate, self.accounts.values().collect())
    }
}

/// Synthetic ticket used to probe routing at instrument-add time; routing
/// is pure over instrument attributes, so the same answer comes back at
/// fill time.
fn probe_ticket(instrument: &Instrument) -> OrderTicket {
    OrderTicket {
        order_id: 0,
        instrument: instrument.clone(),
        side: Side::Bid,
        quantity: Qty::ZERO,
        limit_price: None,
        tag: String::new(),
    }
}
