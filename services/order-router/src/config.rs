//! Router configuration document
//!
//! Consumed once at setup:
//! `{ accounts: {name: initial_cash}, router: {type, mappings, default} }`.
//! Initial cash is fixed-point (4 decimal places) like every other amount
//! in the engine.

use crate::{
    DefaultRouter, InstrumentKindRouter, MarketRouter, OrderRouter, RouterError, TickerRouter,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Strategy selection block of the configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSpec {
    /// Strategy type: "market", "security_type", "symbol" or "default"
    #[serde(rename = "type")]
    pub kind: String,
    /// Routing key -> account name
    #[serde(default)]
    pub mappings: FxHashMap<String, String>,
    /// Fallback account for unmapped keys
    pub default: String,
}

/// Top-level routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Account name -> initial cash (fixed-point)
    pub accounts: FxHashMap<String, i64>,
    /// Router strategy selection
    pub router: RouterSpec,
}

impl RouterConfig {
    /// Parse a configuration document from JSON
    pub fn from_json(doc: &str) -> Result<Self, RouterError> {
        serde_json::from_str(doc).map_err(|e| RouterError::InvalidConfiguration {
            reason: e.to_string(),
        })
    }

    /// Build the configured router strategy
    ///
    /// An unknown `type` falls back to market-based routing with a logged
    /// warning; an empty account map aborts setup.
    pub fn build(&self) -> Result<Box<dyn OrderRouter>, RouterError> {
        if self.accounts.is_empty() {
            return Err(RouterError::EmptyAccountMap);
        }
        let known: FxHashSet<String> = self.accounts.keys().cloned().collect();
        let spec = &self.router;

        let router: Box<dyn OrderRouter> = match spec.kind.to_ascii_lowercase().as_str() {
            "market" => Box::new(MarketRouter::new(&spec.mappings, &spec.default, known)?),
            "security_type" => Box::new(InstrumentKindRouter::new(
                &spec.mappings,
                &spec.default,
                known,
            )?),
            "symbol" => Box::new(TickerRouter::new(&spec.mappings, &spec.default, known)?),
            "default" => Box::new(DefaultRouter::new(&spec.default, known)?),
            other => {
                warn!(
                    "Unknown router type '{}', falling back to market routing",
                    other
                );
                Box::new(MarketRouter::new(&spec.mappings, &spec.default, known)?)
            }
        };
        Ok(router)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        let mut accounts = FxHashMap::default();
        accounts.insert("main".to_string(), 0);
        Self {
            accounts,
            router: RouterSpec {
                kind: "default".to_string(),
                mappings: FxHashMap::default(),
                default: "main".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "accounts": {"IBKR": 500000000, "Kraken": 500000000},
        "router": {
            "type": "market",
            "mappings": {"USA": "IBKR", "Kraken": "Kraken"},
            "default": "IBKR"
        }
    }"#;

    #[test]
    fn test_parse_and_build() {
        let config = RouterConfig::from_json(DOC).unwrap();
        let router = config.build().unwrap();
        assert_eq!(router.name(), "market");
        assert!(router.validate());
    }

    #[test]
    fn test_unknown_type_falls_back_to_market() {
        let mut config = RouterConfig::from_json(DOC).unwrap();
        config.router.kind = "galaxy".to_string();
        let router = config.build().unwrap();
        assert_eq!(router.name(), "market");
    }

    #[test]
    fn test_empty_accounts_abort_setup() {
        let mut config = RouterConfig::from_json(DOC).unwrap();
        config.accounts.clear();
        assert!(matches!(config.build(), Err(RouterError::EmptyAccountMap)));
    }

    #[test]
    fn test_config_round_trip() {
        let config = RouterConfig::from_json(DOC).unwrap();
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded = RouterConfig::from_json(&encoded).unwrap();
        assert_eq!(decoded.router.kind, "market");
        assert_eq!(decoded.accounts.len(), 2);
    }
}
