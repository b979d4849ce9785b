//! Shared types for the arbitrage execution core
//!
//! Fixed-point price/quantity primitives, instrument identity with the
//! attributes routing keys off, and the resident market-data views the
//! matcher reads (depth snapshots and top-of-book quotes).

pub mod constants;
pub mod instrument;
pub mod market;
pub mod order;
pub mod types;

pub use constants::*;
pub use instrument::*;
pub use market::*;
pub use order::*;
pub use types::*;
