//! PostgreSQL-backed ledger repository.
//!
//! Balance mutations are issued as a single conditional update plus the entry
//! insert inside one database transaction, so the insufficiency check and the
//! write cannot interleave with a concurrent mutation of the same account.

use crate::error::LedgerError;
use crate::models::{Account, EntryKind, EntryStatus, LedgerEntry};
use crate::repositories::LedgerRepository;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use uuid::Uuid;

const SELECT_ACCOUNT: &str = r#"
    SELECT user_id, balance, is_active, created_at, updated_at
    FROM accounts
    WHERE user_id = $1
"#;

const INSERT_ENTRY: &str = r#"
    INSERT INTO ledger_entries (user_id, kind, delta, status, description)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, user_id, kind, delta, status, description, created_at
"#;

pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conditionally move the balance by `delta` within an open transaction.
    ///
    /// The WHERE clause carries the whole guard: the account must exist, be
    /// active, and stay non-negative after the move. A missing row is then
    /// disambiguated into `AccountNotFound` or `InsufficientBalance`.
    async fn shift_balance(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: Uuid,
        delta: i64,
    ) -> Result<Account, LedgerError> {
        let updated = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = balance + $2, updated_at = NOW()
            WHERE user_id = $1 AND is_active = TRUE AND balance + $2 >= 0
            RETURNING user_id, balance, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(delta)
        .fetch_optional(&mut **tx)
        .await?;

        match updated {
            Some(account) => Ok(account),
            None => {
                let existing = sqlx::query_as::<_, Account>(SELECT_ACCOUNT)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                Err(match existing {
                    Some(account) if account.is_active => LedgerError::InsufficientBalance {
                        balance: account.balance,
                        required: -delta,
                    },
                    _ => LedgerError::AccountNotFound(user_id),
                })
            }
        }
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn find_or_create_account(
        &self,
        user_id: Uuid,
    ) -> Result<(Account, bool), LedgerError> {
        let inserted = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (user_id, balance)
            VALUES ($1, 0)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING user_id, balance, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(account) = inserted {
            return Ok((account, true));
        }

        let existing = sqlx::query_as::<_, Account>(SELECT_ACCOUNT)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))?;

        Ok((existing, false))
    }

    async fn find_account(&self, user_id: Uuid) -> Result<Option<Account>, LedgerError> {
        let account = sqlx::query_as::<_, Account>(SELECT_ACCOUNT)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn deactivate_account(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET is_active = FALSE, updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, balance, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LedgerError::AccountNotFound(user_id))?;

        Ok(account)
    }

    async fn apply_delta(
        &self,
        user_id: Uuid,
        delta: i64,
        kind: EntryKind,
        description: Option<&str>,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        let mut tx = self.pool.begin().await?;

        let account = Self::shift_balance(&mut tx, user_id, delta).await?;

        let entry = sqlx::query_as::<_, LedgerEntry>(INSERT_ENTRY)
            .bind(user_id)
            .bind(kind.as_str())
            .bind(delta)
            .bind(EntryStatus::Completed.as_str())
            .bind(description)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((account, entry))
    }

    async fn apply_daily_bonus(
        &self,
        user_id: Uuid,
        amount: i64,
        day_start: NaiveDateTime,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent claims for the same account; the
        // eligibility check below is stable until commit.
        let current = sqlx::query_as::<_, Account>(
            r#"
            SELECT user_id, balance, is_active, created_at, updated_at
            FROM accounts
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LedgerError::AccountNotFound(user_id))?;

        if !current.is_active {
            return Err(LedgerError::AccountNotFound(user_id));
        }

        let claimed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM ledger_entries
                WHERE user_id = $1 AND kind = $2 AND status = $3 AND created_at >= $4
            )
            "#,
        )
        .bind(user_id)
        .bind(EntryKind::DailyBonus.as_str())
        .bind(EntryStatus::Completed.as_str())
        .bind(day_start)
        .fetch_one(&mut *tx)
        .await?;

        if claimed {
            return Err(LedgerError::AlreadyClaimed);
        }

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = balance + $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, balance, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        let entry = sqlx::query_as::<_, LedgerEntry>(INSERT_ENTRY)
            .bind(user_id)
            .bind(EntryKind::DailyBonus.as_str())
            .bind(amount)
            .bind(EntryStatus::Completed.as_str())
            .bind(Some("Daily bonus"))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((account, entry))
    }

    async fn insert_pending_entry(
        &self,
        user_id: Uuid,
        delta: i64,
        kind: EntryKind,
        description: Option<&str>,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let account = sqlx::query_as::<_, Account>(SELECT_ACCOUNT)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))?;

        if !account.is_active {
            return Err(LedgerError::AccountNotFound(user_id));
        }

        let entry = sqlx::query_as::<_, LedgerEntry>(INSERT_ENTRY)
            .bind(user_id)
            .bind(kind.as_str())
            .bind(delta)
            .bind(EntryStatus::Pending.as_str())
            .bind(description)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(entry)
    }

    async fn settle_pending_entry(
        &self,
        entry_id: i64,
        success: bool,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        let mut tx = self.pool.begin().await?;

        let pending = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, user_id, kind, delta, status, description, created_at
            FROM ledger_entries
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LedgerError::EntryNotFound(entry_id))?;

        if pending.status != EntryStatus::Pending.as_str() {
            return Err(LedgerError::EntryNotFound(entry_id));
        }

        let (account, status) = if success {
            let account = Self::shift_balance(&mut tx, pending.user_id, pending.delta).await?;
            (account, EntryStatus::Completed)
        } else {
            let account = sqlx::query_as::<_, Account>(SELECT_ACCOUNT)
                .bind(pending.user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(LedgerError::AccountNotFound(pending.user_id))?;
            (account, EntryStatus::Failed)
        };

        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            UPDATE ledger_entries
            SET status = $2
            WHERE id = $1
            RETURNING id, user_id, kind, delta, status, description, created_at
            "#,
        )
        .bind(entry_id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((account, entry))
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, user_id, kind, delta, status, description, created_at
            FROM ledger_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn completed_delta_sum(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        let sum: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(delta), 0)::BIGINT
            FROM ledger_entries
            WHERE user_id = $1 AND status = $2
            "#,
        )
        .bind(user_id)
        .bind(EntryStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }
}
