//! Instrument identity and routing attributes

use crate::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// Spot instrument
    Spot,
    /// Perpetual swap
    Perpetual,
    /// Dated future
    Future,
    /// Equity/stock
    Equity,
    /// Currency pair
    Forex,
}

impl InstrumentKind {
    /// Parse from a config key (case-insensitive)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spot" => Some(Self::Spot),
            "perpetual" | "perp" => Some(Self::Perpetual),
            "future" => Some(Self::Future),
            "equity" => Some(Self::Equity),
            "forex" | "fx" => Some(Self::Forex),
            _ => None,
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Spot => "spot",
            Self::Perpetual => "perpetual",
            Self::Future => "future",
            Self::Equity => "equity",
            Self::Forex => "forex",
        };
        write!(f, "{s}")
    }
}

/// Instrument definition carrying the attributes routing keys off
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Engine-internal identifier
    pub symbol: Symbol,
    /// Exchange ticker (e.g. "BTCUSDT")
    pub ticker: String,
    /// Market/venue identifier (e.g. "Binance", "USA")
    pub market: String,
    /// Instrument class
    pub kind: InstrumentKind,
    /// Quote currency the instrument settles in
    pub quote_currency: String,
}

impl Instrument {
    /// Create a new instrument
    #[must_use]
    pub fn new(
        symbol: Symbol,
        ticker: impl Into<String>,
        market: impl Into<String>,
        kind: InstrumentKind,
        quote_currency: impl Into<String>,
    ) -> Self {
        Self {
            symbol,
            ticker: ticker.into(),
            market: market.into(),
            kind,
            quote_currency: quote_currency.into(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ticker, self.market)
    }
}
