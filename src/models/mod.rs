//! Domain models for the coin ledger.
//!
//! This module contains the store-backed models representing accounts and
//! their transaction history.

pub mod account;
pub mod ledger_entry;
pub mod package;

// Re-export all models for convenient access
pub use account::Account;
pub use ledger_entry::{EntryKind, EntryStatus, LedgerEntry};
pub use package::CoinPackage;
