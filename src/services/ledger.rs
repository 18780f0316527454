//! Coin ledger service: all balance mutations and their audit trail.

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::models::{Account, CoinPackage, EntryKind, LedgerEntry};
use crate::repositories::LedgerRepository;
use chrono::{NaiveDateTime, NaiveTime, Utc};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Upper bound on transaction page size
const MAX_PAGE_SIZE: u32 = 100;

/// Result of a successful daily-bonus claim
#[derive(Debug, Clone)]
pub struct DailyBonusGrant {
    pub account: Account,
    pub coins_added: i64,
}

/// Result of processing a referred signup
#[derive(Debug, Clone)]
pub struct ReferralOutcome {
    /// None when the referrer account was missing and the bounty was skipped
    pub referrer: Option<Account>,
    pub referred: Account,
}

/// Account state together with its reconciled ledger total
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: Account,
    pub ledger_total: i64,
}

impl AccountSummary {
    /// The balance must equal the sum of completed entry deltas
    pub fn is_reconciled(&self) -> bool {
        self.account.balance == self.ledger_total
    }
}

/// Service owning per-user coin balances and the append-only transaction log.
///
/// Persistence is injected at construction; all mutating operations for one
/// account are serialized by the repository, so callers may invoke the
/// service from any number of concurrent request handlers.
pub struct LedgerService {
    repo: Arc<dyn LedgerRepository>,
    config: LedgerConfig,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn LedgerRepository>, config: LedgerConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Credit coins to an account
    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: EntryKind,
        description: &str,
    ) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        info!(
            "Crediting coins: user={}, amount={}, kind={}",
            user_id,
            amount,
            kind.as_str()
        );

        let (account, _) = self
            .run_op(|| self.repo.apply_delta(user_id, amount, kind, Some(description)))
            .await?;

        Ok(account)
    }

    /// Debit coins from an account.
    ///
    /// Fails with `InsufficientBalance` when the balance cannot cover the
    /// amount; nothing is mutated and no entry is appended in that case.
    pub async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: EntryKind,
        description: &str,
    ) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        info!(
            "Debiting coins: user={}, amount={}, kind={}",
            user_id,
            amount,
            kind.as_str()
        );

        let (account, _) = self
            .run_op(|| self.repo.apply_delta(user_id, -amount, kind, Some(description)))
            .await?;

        Ok(account)
    }

    /// Claim the once-per-day bonus.
    ///
    /// The day window starts at UTC midnight. The eligibility check and the
    /// credit are one atomic unit, so concurrent claims by the same user
    /// yield exactly one grant.
    pub async fn claim_daily_bonus(&self, user_id: Uuid) -> Result<DailyBonusGrant, LedgerError> {
        let amount = self.config.daily_bonus;
        let day_start = utc_day_start();

        let (account, entry) = self
            .run_op(|| self.repo.apply_daily_bonus(user_id, amount, day_start))
            .await?;

        info!(
            "Daily bonus claimed: user={}, amount={}, entry={}",
            user_id, amount, entry.id
        );

        Ok(DailyBonusGrant {
            account,
            coins_added: amount,
        })
    }

    /// Transaction history, newest first; 1-based page, limit clamped to 100
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(limit);

        self.run_op(|| self.repo.list_entries(user_id, i64::from(limit), offset))
            .await
    }

    /// Create an account on signup, granting the welcome bonus once.
    ///
    /// Safe to call repeatedly for the same user: an existing account is
    /// returned unchanged, without a second grant.
    pub async fn register_account(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        let (account, created) = self
            .run_op(|| self.repo.find_or_create_account(user_id))
            .await?;

        if !created {
            return Ok(account);
        }

        info!("Account created: user={}", user_id);

        if self.config.welcome_grant > 0 {
            return self
                .credit(user_id, self.config.welcome_grant, EntryKind::Bonus, "Welcome bonus")
                .await;
        }

        Ok(account)
    }

    /// Credit both sides of a referred signup.
    ///
    /// The referrer bounty is best-effort: a missing referrer account skips
    /// that credit without failing the referred user's bonus.
    pub async fn process_referral_bonus(
        &self,
        referrer_id: Uuid,
        referred_id: Uuid,
    ) -> Result<ReferralOutcome, LedgerError> {
        let referrer = match self
            .credit(
                referrer_id,
                self.config.referral_bounty,
                EntryKind::Referral,
                "Referral bounty",
            )
            .await
        {
            Ok(account) => Some(account),
            Err(LedgerError::AccountNotFound(_)) => {
                warn!(
                    "Referrer account missing, skipping bounty: referrer={}",
                    referrer_id
                );
                None
            }
            Err(err) => return Err(err),
        };

        let referred = self
            .credit(
                referred_id,
                self.config.referral_signup_bonus,
                EntryKind::Referral,
                "Referral signup bonus",
            )
            .await?;

        Ok(ReferralOutcome { referrer, referred })
    }

    /// Credit the coins of a purchased package, after the payment gateway
    /// has confirmed the charge
    pub async fn purchase_coins(
        &self,
        user_id: Uuid,
        package: CoinPackage,
    ) -> Result<Account, LedgerError> {
        let description = format!("Purchased {} coin package", package.as_str());
        self.credit(user_id, package.coins(), EntryKind::Purchase, &description)
            .await
    }

    /// Debit the cost of stream access; free channels are a no-op
    pub async fn charge_stream_access(
        &self,
        user_id: Uuid,
        cost: i64,
        description: &str,
    ) -> Result<Account, LedgerError> {
        if cost < 0 {
            return Err(LedgerError::InvalidAmount(cost));
        }

        if cost == 0 {
            return self.get_account(user_id).await;
        }

        self.debit(user_id, cost, EntryKind::StreamDebit, description)
            .await
    }

    /// Record a credit awaiting external confirmation (e.g. a crypto
    /// deposit); no balance effect until settled
    pub async fn begin_pending_credit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: EntryKind,
        description: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        self.run_op(|| {
            self.repo
                .insert_pending_entry(user_id, amount, kind, Some(description))
        })
        .await
    }

    /// Settle a pending entry: apply its delta and complete it, or mark it
    /// failed with no balance effect
    pub async fn settle_pending(
        &self,
        entry_id: i64,
        success: bool,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        let (account, entry) = self
            .run_op(|| self.repo.settle_pending_entry(entry_id, success))
            .await?;

        info!(
            "Pending entry settled: entry={}, status={}, user={}",
            entry.id, entry.status, entry.user_id
        );

        Ok((account, entry))
    }

    /// Current account state; inactive accounts are reported as not found
    pub async fn get_account(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        let account = self
            .run_op(|| self.repo.find_account(user_id))
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))?;

        if !account.is_active {
            return Err(LedgerError::AccountNotFound(user_id));
        }

        Ok(account)
    }

    /// Soft-deactivate an account; history is retained
    pub async fn deactivate_account(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        info!("Deactivating account: user={}", user_id);
        self.run_op(|| self.repo.deactivate_account(user_id)).await
    }

    /// Account state plus the reconciled sum of its completed entries
    pub async fn account_summary(&self, user_id: Uuid) -> Result<AccountSummary, LedgerError> {
        let account = self
            .run_op(|| self.repo.find_account(user_id))
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))?;

        let ledger_total = self
            .run_op(|| self.repo.completed_delta_sum(user_id))
            .await?;

        Ok(AccountSummary {
            account,
            ledger_total,
        })
    }

    /// Run a repository operation under the per-operation timeout, retrying
    /// once with backoff on a transient store failure. Terminal errors are
    /// never retried.
    async fn run_op<T, F, Fut>(&self, op: F) -> Result<T, LedgerError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        match self.attempt(op()).await {
            Err(err) if err.is_retryable() => {
                warn!("Transient store failure, retrying once: {}", err);
                tokio::time::sleep(self.config.retry_backoff()).await;
                self.attempt(op()).await
            }
            other => other,
        }
    }

    async fn attempt<T>(
        &self,
        fut: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        match tokio::time::timeout(self.config.op_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::StoreUnavailable(
                "store operation timed out".to_string(),
            )),
        }
    }
}

/// Start of the current day window (UTC midnight)
fn utc_day_start() -> NaiveDateTime {
    Utc::now().date_naive().and_time(NaiveTime::MIN)
}
