//! Routing ledger view
//!
//! A read-only façade over the aggregate ledger and the sub-account
//! ledgers that resolves a currency lookup to whichever ledger actually
//! owns that currency.

use crate::error::PortfolioError;
use crate::ledger::{CashEntry, SubAccountLedger};

/// Read-only currency resolution across the aggregate and sub-accounts
pub struct RoutingLedgerView<'a> {
    aggregate: &'a SubAccountLedger,
    subs: Vec<&'a SubAccountLedger>,
}

impl<'a> RoutingLedgerView<'a> {
    /// Create a view over an aggregate ledger and its sub-accounts
    #[must_use]
    pub fn new(aggregate: &'a SubAccountLedger, subs: Vec<&'a SubAccountLedger>) -> Self {
        Self { aggregate, subs }
    }

    /// Resolve a currency entry: aggregate first, then sub-accounts
    #[must_use]
    pub fn resolve(&self, currency: &str) -> Option<&'a CashEntry> {
        if let Some(entry) = self.aggregate.cash_entry(currency) {
            return Some(entry);
        }
        self.subs.iter().find_map(|sub| sub.cash_entry(currency))
    }

    /// Balance for a currency across whichever ledger owns it
    ///
    /// Absence is a configuration error, distinct from a transient zero
    /// conversion rate.
    pub fn balance(&self, currency: &str) -> Result<i64, PortfolioError> {
        self.resolve(currency)
            .map(|e| e.amount)
            .ok_or_else(|| PortfolioError::MissingCurrency {
                account: self.aggregate.name().to_string(),
                currency: currency.to_string(),
            })
    }
}
