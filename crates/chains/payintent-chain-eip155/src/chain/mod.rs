//! Core EVM chain types and ledger access.
//!
//! - [`types`] - Checksummed addresses, chain references, token deployments
//! - [`ledger`] - Read-only contract calls through the [`LedgerQuery`] capability
//! - [`probe`] - Ordered fallback over alternative contract reads

pub mod ledger;
pub mod probe;
pub mod types;

pub use ledger::*;
pub use probe::*;
pub use types::*;
