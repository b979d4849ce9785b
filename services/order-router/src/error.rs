//! Router configuration errors

use thiserror::Error;

/// Errors raised while building or validating a router configuration
#[derive(Debug, Error)]
pub enum RouterError {
    /// Default account name is null/empty
    #[error("Default account name is empty")]
    EmptyDefaultAccount,

    /// No accounts configured
    #[error("Account map is empty")]
    EmptyAccountMap,

    /// Mapping key does not name a known instrument class
    #[error("Unknown instrument class in mapping: {key}")]
    UnknownInstrumentKind { key: String },

    /// Router configuration failed validation
    #[error("Router configuration invalid: {reason}")]
    InvalidConfiguration { reason: String },
}
