//! Order routing strategies
//!
//! Maps an order to the account that owns it. Routing is a pure,
//! deterministic function of order attributes: callers probe it at
//! instrument-add time and again at fill time and must get the same answer
//! both times. Four interchangeable strategies share one contract.

pub mod config;
pub mod error;

pub use config::{RouterConfig, RouterSpec};
pub use error::RouterError;

use rustc_hash::{FxHashMap, FxHashSet};
use services_common::{InstrumentKind, OrderTicket};

/// Routing contract shared by all strategies
pub trait OrderRouter: Send + Sync {
    /// Resolve the account that owns this order
    fn route(&self, order: &OrderTicket) -> &str;

    /// Check the configuration is usable: mappings non-empty (where the
    /// strategy carries mappings) and the default account known
    fn validate(&self) -> bool;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// Routes every order to one fixed account
pub struct DefaultRouter {
    default_account: String,
    known_accounts: FxHashSet<String>,
}

impl DefaultRouter {
    /// Create a new fixed router
    pub fn new(
        default_account: impl Into<String>,
        known_accounts: FxHashSet<String>,
    ) -> Result<Self, RouterError> {
        let default_account = default_account.into();
        if default_account.is_empty() {
            return Err(RouterError::EmptyDefaultAccount);
        }
        Ok(Self {
            default_account,
            known_accounts,
        })
    }
}

impl OrderRouter for DefaultRouter {
    fn route(&self, _order: &OrderTicket) -> &str {
        &self.default_account
    }

    fn validate(&self) -> bool {
        self.known_accounts.contains(&self.default_account)
    }

    fn name(&self) -> &str {
        "default"
    }
}

/// Routes by market identifier, case-insensitive, with default fallback
pub struct MarketRouter {
    /// Lowercased market -> account
    mappings: FxHashMap<String, String>,
    default_account: String,
    known_accounts: FxHashSet<String>,
}

impl MarketRouter {
    /// Create a new market router; mapping keys are folded to lowercase
    pub fn new(
        mappings: &FxHashMap<String, String>,
        default_account: impl Into<String>,
        known_accounts: FxHashSet<String>,
    ) -> Result<Self, RouterError> {
        let default_account = default_account.into();
        if default_account.is_empty() {
            return Err(RouterError::EmptyDefaultAccount);
        }
        let mappings = mappings
            .iter()
            .map(|(market, account)| (market.to_ascii_lowercase(), account.clone()))
            .collect();
        Ok(Self {
            mappings,
            default_account,
            known_accounts,
        })
    }
}

impl OrderRouter for MarketRouter {
    fn route(&self, order: &OrderTicket) -> &str {
        let market = order.instrument.market.to_ascii_lowercase();
        self.mappings
            .get(&market)
            .map_or(&self.default_account, String::as_str)
    }

    fn validate(&self) -> bool {
        !self.mappings.is_empty() && self.known_accounts.contains(&self.default_account)
    }

    fn name(&self) -> &str {
        "market"
    }
}

/// Routes by instrument class, with default fallback
pub struct InstrumentKindRouter {
    mappings: FxHashMap<InstrumentKind, String>,
    default_account: String,
    known_accounts: FxHashSet<String>,
}

impl InstrumentKindRouter {
    /// Create a new instrument-class router from string keys
    ///
    /// Keys that do not name a known instrument class reject the
    /// configuration outright rather than routing surprisingly.
    pub fn new(
        mappings: &FxHashMap<String, String>,
        default_account: impl Into<String>,
        known_accounts: FxHashSet<String>,
    ) -> Result<Self, RouterError> {
        let default_account = default_account.into();
        if default_account.is_empty() {
            return Err(RouterError::EmptyDefaultAccount);
        }
        let mut parsed = FxHashMap::default();
        for (key, account) in mappings {
            let kind = InstrumentKind::parse(key).ok_or_else(|| {
                RouterError::UnknownInstrumentKind { key: key.clone() }
            })?;
            parsed.insert(kind, account.clone());
        }
        Ok(Self {
            mappings: parsed,
            default_account,
            known_accounts,
        })
    }
}

impl OrderRouter for InstrumentKindRouter {
    fn route(&self, order: &OrderTicket) -> &str {
        self.mappings
            .get(&order.instrument.kind)
            .map_or(&self.default_account, String::as_str)
    }

    fn validate(&self) -> bool {
        !self.mappings.is_empty() && self.known_accounts.contains(&self.default_account)
    }

    fn name(&self) -> &str {
        "security_type"
    }
}

/// Routes by exact ticker identity, with default fallback
pub struct TickerRouter {
    mappings: FxHashMap<String, String>,
    default_account: String,
    known_accounts: FxHashSet<String>,
}

impl TickerRouter {
    /// Create a new ticker router; tickers match exactly
    pub fn new(
        mappings: &FxHashMap<String, String>,
        default_account: impl Into<String>,
        known_accounts: FxHashSet<String>,
    ) -> Result<Self, RouterError> {
        let default_account = default_account.into();
        if default_account.is_empty() {
            return Err(RouterError::EmptyDefaultAccount);
        }
        Ok(Self {
            mappings: mappings.clone(),
            default_account,
            known_accounts,
        })
    }
}

impl OrderRouter for TickerRouter {
    fn route(&self, order: &OrderTicket) -> &str {
        self.mappings
            .get(&order.instrument.ticker)
            .map_or(&self.default_account, String::as_str)
    }

    fn validate(&self) -> bool {
        !self.mappings.is_empty() && self.known_accounts.contains(&self.default_account)
    }

    fn name(&self) -> &str {
        "symbol"
    }
}
