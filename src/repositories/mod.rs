//! Persistence interface for the coin ledger.
//!
//! The ledger service receives a `LedgerRepository` handle at construction;
//! nothing in the crate holds process-wide storage state. Two implementations
//! are provided: PostgreSQL for production and an in-memory store for tests
//! and embedding.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedgerRepository;
pub use postgres::PgLedgerRepository;

use crate::error::LedgerError;
use crate::models::{Account, EntryKind, LedgerEntry};
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Storage operations the ledger requires.
///
/// Implementations must serialize all balance-mutating operations per
/// account: `apply_delta`, `apply_daily_bonus` and `settle_pending_entry`
/// each perform their check, balance mutation and entry append as one atomic
/// unit. Operations on different accounts are independent.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Create an account with a zero balance, or return the existing one.
    /// The second element is true when the account was created by this call.
    async fn find_or_create_account(&self, user_id: uuid::Uuid)
        -> Result<(Account, bool), LedgerError>;

    /// Look up an account, active or not
    async fn find_account(&self, user_id: uuid::Uuid) -> Result<Option<Account>, LedgerError>;

    /// Soft-deactivate an account; its history is retained
    async fn deactivate_account(&self, user_id: uuid::Uuid) -> Result<Account, LedgerError>;

    /// Atomically apply a signed delta to the balance and append a completed
    /// entry recording it.
    ///
    /// Fails with `AccountNotFound` for missing or inactive accounts and with
    /// `InsufficientBalance` when a negative delta would overdraw; on failure
    /// nothing is mutated and no entry is appended.
    async fn apply_delta(
        &self,
        user_id: uuid::Uuid,
        delta: i64,
        kind: EntryKind,
        description: Option<&str>,
    ) -> Result<(Account, LedgerEntry), LedgerError>;

    /// Credit the daily bonus iff no completed `daily_bonus` entry exists at
    /// or after `day_start`; the eligibility check and the credit are one
    /// atomic unit. Fails with `AlreadyClaimed` otherwise.
    async fn apply_daily_bonus(
        &self,
        user_id: uuid::Uuid,
        amount: i64,
        day_start: NaiveDateTime,
    ) -> Result<(Account, LedgerEntry), LedgerError>;

    /// Append a pending entry with no balance effect
    async fn insert_pending_entry(
        &self,
        user_id: uuid::Uuid,
        delta: i64,
        kind: EntryKind,
        description: Option<&str>,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Settle a pending entry: on success, atomically apply its delta and
    /// mark it completed; on failure, mark it failed with no balance effect.
    ///
    /// A completing debit that would overdraw fails with
    /// `InsufficientBalance` and leaves the entry pending.
    async fn settle_pending_entry(
        &self,
        entry_id: i64,
        success: bool,
    ) -> Result<(Account, LedgerEntry), LedgerError>;

    /// Entries for a user, newest first (`created_at` desc, id desc)
    async fn list_entries(
        &self,
        user_id: uuid::Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Sum of completed entry deltas for a user; reconciles against the
    /// account balance
    async fn completed_delta_sum(&self, user_id: uuid::Uuid) -> Result<i64, LedgerError>;
}
