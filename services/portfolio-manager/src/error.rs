//! Portfolio error types

use order_router::RouterError;
use thiserror::Error;

/// Errors raised by the multi-account portfolio layer
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Account name not present in the configured account set
    #[error("Unknown account: {name}")]
    UnknownAccount { name: String },

    /// An account lacks buying power for its share of an order batch
    #[error("Insufficient buying power in {account}: required {required}, available {available}")]
    InsufficientBuyingPower {
        account: String,
        required: i64,
        available: i64,
    },

    /// Account is missing a currency entry entirely (configuration error,
    /// as opposed to a transient zero rate)
    #[error("Account {account} has no entry for currency {currency}")]
    MissingCurrency { account: String, currency: String },

    /// Router configuration failed at setup
    #[error(transparent)]
    Router(#[from] RouterError),
}
