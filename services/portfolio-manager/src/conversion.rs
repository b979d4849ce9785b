//! Shared currency-conversion state and the aggregate reconciliation pass
//!
//! A conversion rate is one atomic cell behind an `Arc`. Sub-account and
//! aggregate cash entries clone the handle; only the market-data owner
//! calls `set_rate`. A zero rate means the live subscription has not
//! initialized yet - a transient state, not an error. A currency *absent*
//! from a ledger is a configuration error and is reported, never papered
//! over.

use crate::ledger::SubAccountLedger;
use rustc_hash::FxHashSet;
use serde::Serialize;
use services_common::SCALE_4;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, info};

/// Shared reference to one conversion rate
pub type ConversionHandle = Arc<ConversionRate>;

/// A single currency-conversion rate, fixed-point (SCALE_4 = 1.0)
///
/// Single-writer: the feed that owns the subscription updates the rate;
/// every ledger entry holding the handle reads it.
#[derive(Debug)]
pub struct ConversionRate {
    /// Conversion pair, e.g. "EURUSD"
    pair: String,
    /// Rate in fixed-point; zero until the subscription initializes
    rate: AtomicI64,
}

impl ConversionRate {
    /// Create an uninitialized rate for a pair
    #[must_use]
    pub fn pending(pair: impl Into<String>) -> ConversionHandle {
        Arc::new(Self {
            pair: pair.into(),
            rate: AtomicI64::new(0),
        })
    }

    /// Create an identity rate (pegged 1:1, never needs a subscription)
    #[must_use]
    pub fn identity(pair: impl Into<String>) -> ConversionHandle {
        Arc::new(Self {
            pair: pair.into(),
            rate: AtomicI64::new(SCALE_4),
        })
    }

    /// Conversion pair name
    #[must_use]
    pub fn pair(&self) -> &str {
        &self.pair
    }

    /// Current rate in fixed-point
    #[must_use]
    pub fn rate(&self) -> i64 {
        self.rate.load(Ordering::Acquire)
    }

    /// True once the live subscription has published a rate
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.rate() != 0
    }

    /// Update the rate; called only by the subscription owner
    pub fn set_rate(&self, rate: i64) {
        self.rate.store(rate, Ordering::Release);
    }

    /// Convert an amount in the source currency into the base currency
    #[must_use]
    pub fn to_base(&self, amount: i64) -> i64 {
        (amount * self.rate()) / SCALE_4
    }
}

/// Result of one aggregate reconciliation pass
///
/// `deferred` lists currencies still waiting on a live conversion rate;
/// the engine re-invokes the sync when the next rate initializes rather
/// than relying on event ordering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncOutcome {
    /// True when every folded currency has a usable conversion
    pub complete: bool,
    /// Currencies folded with a zero/pending rate
    pub deferred: Vec<String>,
}

/// Orchestrates conversion subscriptions and the aggregate fold
pub struct ConversionCoordinator {
    /// Settlement currency of the aggregate view
    settlement_currency: String,
    /// Currencies pegged 1:1 to the settlement currency; injectable so it
    /// is testable and overridable, not a process-wide constant
    pegged: FxHashSet<String>,
}

impl ConversionCoordinator {
    /// Create a coordinator for a settlement currency and pegged set
    #[must_use]
    pub fn new(settlement_currency: impl Into<String>, pegged: FxHashSet<String>) -> Self {
        Self {
            settlement_currency: settlement_currency.into(),
            pegged,
        }
    }

    /// Settlement currency of the aggregate
    #[must_use]
    pub fn settlement_currency(&self) -> &str {
        &self.settlement_currency
    }

    /// True when a currency needs no live subscription
    #[must_use]
    pub fn is_pegged(&self, currency: &str) -> bool {
        currency == self.settlement_currency || self.pegged.contains(currency)
    }

    /// Register conversion handles for every foreign-currency entry of a
    /// sub-account, in that account's own base currency
    ///
    /// Entries that already carry a handle are left alone. Returns the
    /// handles created this pass so the market-data owner can subscribe
    /// and start publishing rates.
    pub fn ensure_conversions(&self, ledger: &mut SubAccountLedger) -> Vec<ConversionHandle> {
        let base = ledger.base_currency().to_string();
        let account = ledger.name().to_string();
        let mut created = Vec::new();

        for entry in ledger.cash_entries_mut() {
            if entry.currency == base || entry.conversion.is_some() {
                continue;
            }
            let pair = format!("{}{}", entry.currency, base);
            let handle = if self.is_pegged(&entry.currency) {
                entry.pegged = true;
                ConversionRate::identity(&pair)
            } else {
                let h = ConversionRate::pending(&pair);
                created.push(Arc::clone(&h));
                h
            };
            debug!(
                account = %account,
                pair = %pair,
                "registered conversion handle"
            );
            entry.conversion = Some(handle);
        }
        created
    }

    /// Fold all sub-account balances into the aggregate ledger
    ///
    /// Zeroes the aggregate's pre-existing balances, sums same-currency
    /// balances across sub-accounts, and attaches the first live conversion
    /// handle found for each currency - a shared reference, never a second
    /// subscription. Pegged currencies get an identity rate. Safe to call
    /// before conversion initialization completes: pending currencies are
    /// reported in the outcome for a later re-sync.
    pub fn sync_aggregate(
        &self,
        aggregate: &mut SubAccountLedger,
        subs: &[&SubAccountLedger],
    ) -> SyncOutcome {
        aggregate.zero_cash();

        for sub in subs {
            for entry in sub.cash_entries() {
                let agg = aggregate.cash_entry_mut(&entry.currency);
                agg.amount += entry.amount;

                if agg.conversion.is_none() && self.is_pegged(&entry.currency) {
                    agg.pegged = true;
                    agg.conversion = Some(ConversionRate::identity(format!(
                        "{}{}",
                        entry.currency, self.settlement_currency
                    )));
                }
                // Attach the first live handle seen; keep an already-live
                // aggregate handle over a pending sub-account one.
                let agg_live = agg
                    .conversion
                    .as_ref()
                    .is_some_and(|h| h.is_initialized());
                if !agg_live {
                    if let Some(handle) = &entry.conversion {
                        if handle.is_initialized() || agg.conversion.is_none() {
                            agg.conversion = Some(Arc::clone(handle));
                        }
                    }
                }
            }
        }

        let deferred: Vec<String> = aggregate
            .cash_entries()
            .filter(|e| {
                e.currency != self.settlement_currency
                    && !e.pegged
                    && !e
                        .conversion
                        .as_ref()
                        .is_some_and(|h| h.is_initialized())
            })
            .map(|e| e.currency.clone())
            .collect();

        if deferred.is_empty() {
            debug!("aggregate cash sync complete");
        } else {
            info!(
                deferred = ?deferred,
                "aggregate cash sync deferred pending conversion rates"
            );
        }
        SyncOutcome {
            complete: deferred.is_empty(),
            deferred,
        }
    }
}
