//! Multi-account portfolio synchronization
//!
//! Independent per-account ledgers (cash, holdings, margin) kept mutually
//! consistent with a derived aggregate view:
//! - each instrument lives in exactly one sub-account ledger
//! - fills are forwarded via the order's original routing decision
//! - aggregate value/margin/cash are recomputed from the sub-accounts on
//!   every read, never cached independently
//! - currency-conversion rates are shared handles with a single writer,
//!   folded into the aggregate by an explicit reconciliation pass

pub mod conversion;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod view;

pub use conversion::{ConversionCoordinator, ConversionHandle, ConversionRate, SyncOutcome};
pub use error::PortfolioError;
pub use ledger::{CashEntry, Holding, SubAccountLedger};
pub use manager::MultiAccountManager;
pub use view::RoutingLedgerView;
