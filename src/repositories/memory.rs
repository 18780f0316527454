//! In-memory ledger repository.
//!
//! Each account lives behind its own `tokio::sync::Mutex`, held for the full
//! check-mutate-append sequence, so concurrent operations on one account are
//! serialized while different accounts proceed in parallel. Used by the test
//! harness and by embedders that want the ledger without a database.

use crate::error::LedgerError;
use crate::models::{Account, EntryKind, EntryStatus, LedgerEntry};
use crate::repositories::LedgerRepository;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

struct AccountCell {
    account: Account,
    entries: Vec<LedgerEntry>,
}

#[derive(Default)]
pub struct InMemoryLedgerRepository {
    accounts: RwLock<HashMap<Uuid, Arc<Mutex<AccountCell>>>>,
    // Pending entry id -> owning account, for settlement lookup
    pending_index: Mutex<HashMap<i64, Uuid>>,
    next_entry_id: AtomicI64,
}

fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn cell(&self, user_id: Uuid) -> Result<Arc<Mutex<AccountCell>>, LedgerError> {
        self.accounts
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(user_id))
    }

    fn next_id(&self) -> i64 {
        self.next_entry_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn make_entry(
        &self,
        user_id: Uuid,
        delta: i64,
        kind: EntryKind,
        status: EntryStatus,
        description: Option<&str>,
    ) -> LedgerEntry {
        LedgerEntry {
            id: self.next_id(),
            user_id,
            kind: kind.as_str().to_string(),
            delta,
            status: status.as_str().to_string(),
            description: description.map(|d| d.to_string()),
            created_at: now(),
        }
    }

    /// Apply a delta to a locked cell; the caller holds the account mutex
    fn shift_locked(
        cell: &mut AccountCell,
        user_id: Uuid,
        delta: i64,
    ) -> Result<(), LedgerError> {
        if !cell.account.is_active {
            return Err(LedgerError::AccountNotFound(user_id));
        }

        let new_balance = cell.account.balance + delta;
        if new_balance < 0 {
            return Err(LedgerError::InsufficientBalance {
                balance: cell.account.balance,
                required: -delta,
            });
        }

        cell.account.balance = new_balance;
        cell.account.updated_at = now();
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn find_or_create_account(
        &self,
        user_id: Uuid,
    ) -> Result<(Account, bool), LedgerError> {
        let mut accounts = self.accounts.write().await;

        if let Some(cell) = accounts.get(&user_id) {
            let cell = cell.lock().await;
            return Ok((cell.account.clone(), false));
        }

        let ts = now();
        let account = Account {
            user_id,
            balance: 0,
            is_active: true,
            created_at: ts,
            updated_at: ts,
        };
        accounts.insert(
            user_id,
            Arc::new(Mutex::new(AccountCell {
                account: account.clone(),
                entries: Vec::new(),
            })),
        );

        Ok((account, true))
    }

    async fn find_account(&self, user_id: Uuid) -> Result<Option<Account>, LedgerError> {
        let cell = match self.accounts.read().await.get(&user_id).cloned() {
            Some(cell) => cell,
            None => return Ok(None),
        };

        let cell = cell.lock().await;
        Ok(Some(cell.account.clone()))
    }

    async fn deactivate_account(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        let cell = self.cell(user_id).await?;
        let mut cell = cell.lock().await;

        cell.account.is_active = false;
        cell.account.updated_at = now();

        Ok(cell.account.clone())
    }

    async fn apply_delta(
        &self,
        user_id: Uuid,
        delta: i64,
        kind: EntryKind,
        description: Option<&str>,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        let cell = self.cell(user_id).await?;
        let mut cell = cell.lock().await;

        Self::shift_locked(&mut cell, user_id, delta)?;

        let entry = self.make_entry(user_id, delta, kind, EntryStatus::Completed, description);
        cell.entries.push(entry.clone());

        Ok((cell.account.clone(), entry))
    }

    async fn apply_daily_bonus(
        &self,
        user_id: Uuid,
        amount: i64,
        day_start: NaiveDateTime,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        let cell = self.cell(user_id).await?;
        let mut cell = cell.lock().await;

        if !cell.account.is_active {
            return Err(LedgerError::AccountNotFound(user_id));
        }

        let claimed = cell.entries.iter().any(|e| {
            e.kind == EntryKind::DailyBonus.as_str()
                && e.status == EntryStatus::Completed.as_str()
                && e.created_at >= day_start
        });
        if claimed {
            return Err(LedgerError::AlreadyClaimed);
        }

        Self::shift_locked(&mut cell, user_id, amount)?;

        let entry = self.make_entry(
            user_id,
            amount,
            EntryKind::DailyBonus,
            EntryStatus::Completed,
            Some("Daily bonus"),
        );
        cell.entries.push(entry.clone());

        Ok((cell.account.clone(), entry))
    }

    async fn insert_pending_entry(
        &self,
        user_id: Uuid,
        delta: i64,
        kind: EntryKind,
        description: Option<&str>,
    ) -> Result<LedgerEntry, LedgerError> {
        let cell = self.cell(user_id).await?;
        let mut cell = cell.lock().await;

        if !cell.account.is_active {
            return Err(LedgerError::AccountNotFound(user_id));
        }

        let entry = self.make_entry(user_id, delta, kind, EntryStatus::Pending, description);
        cell.entries.push(entry.clone());
        drop(cell);

        self.pending_index.lock().await.insert(entry.id, user_id);

        Ok(entry)
    }

    async fn settle_pending_entry(
        &self,
        entry_id: i64,
        success: bool,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        let user_id = self
            .pending_index
            .lock()
            .await
            .get(&entry_id)
            .copied()
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        let cell = self.cell(user_id).await?;
        let mut cell = cell.lock().await;

        let idx = cell
            .entries
            .iter()
            .position(|e| e.id == entry_id && e.status == EntryStatus::Pending.as_str())
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        if success {
            let delta = cell.entries[idx].delta;
            Self::shift_locked(&mut cell, user_id, delta)?;
            cell.entries[idx].status = EntryStatus::Completed.as_str().to_string();
        } else {
            cell.entries[idx].status = EntryStatus::Failed.as_str().to_string();
        }

        let entry = cell.entries[idx].clone();
        let account = cell.account.clone();
        drop(cell);

        self.pending_index.lock().await.remove(&entry_id);

        Ok((account, entry))
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let cell = match self.accounts.read().await.get(&user_id).cloned() {
            Some(cell) => cell,
            None => return Ok(Vec::new()),
        };

        let cell = cell.lock().await;
        let mut entries = cell.entries.clone();
        entries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(entries
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn completed_delta_sum(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        let cell = match self.accounts.read().await.get(&user_id).cloned() {
            Some(cell) => cell,
            None => return Ok(0),
        };

        let cell = cell.lock().await;
        Ok(cell
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Completed.as_str())
            .map(|e| e.delta)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_apply_delta_guards_balance() {
        let repo = InMemoryLedgerRepository::new();
        let user = Uuid::new_v4();

        let (account, created) = repo.find_or_create_account(user).await.unwrap();
        assert!(created);
        assert_eq!(account.balance, 0);

        let (account, _) = repo
            .apply_delta(user, 100, EntryKind::Bonus, Some("Welcome bonus"))
            .await
            .unwrap();
        assert_eq!(account.balance, 100);

        let err = repo
            .apply_delta(user, -150, EntryKind::StreamDebit, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

        // Failed debit left no trace
        assert_eq!(repo.completed_delta_sum(user).await.unwrap(), 100);
        assert_eq!(repo.list_entries(user, 10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let repo = InMemoryLedgerRepository::new();
        let err = repo
            .apply_delta(Uuid::new_v4(), 10, EntryKind::Bonus, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_entry_ids_are_monotonic() {
        let repo = InMemoryLedgerRepository::new();
        let user = Uuid::new_v4();
        repo.find_or_create_account(user).await.unwrap();

        let (_, first) = repo
            .apply_delta(user, 10, EntryKind::Bonus, None)
            .await
            .unwrap();
        let (_, second) = repo
            .apply_delta(user, 10, EntryKind::Bonus, None)
            .await
            .unwrap();
        assert!(second.id > first.id);
    }
}
