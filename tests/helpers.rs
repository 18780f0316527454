use async_trait::async_trait;
use bulldog_backend::api::CoinsApi;
use bulldog_backend::config::LedgerConfig;
use bulldog_backend::error::LedgerError;
use bulldog_backend::models::{Account, EntryKind, LedgerEntry};
use bulldog_backend::repositories::{InMemoryLedgerRepository, LedgerRepository};
use bulldog_backend::services::LedgerService;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Test harness wiring the ledger over the in-memory repository
pub struct TestLedger {
    pub repo: Arc<InMemoryLedgerRepository>,
    pub ledger: Arc<LedgerService>,
    pub api: CoinsApi,
}

impl TestLedger {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        bulldog_backend::telemetry::init(&bulldog_backend::AppConfig::default());

        let repo = Arc::new(InMemoryLedgerRepository::new());
        let handle: Arc<dyn LedgerRepository> = repo.clone();
        let ledger = Arc::new(LedgerService::new(handle, config));
        let api = CoinsApi::new(ledger.clone());

        Self { repo, ledger, api }
    }
}

/// Create an account seeded to an exact balance, bypassing the welcome grant
pub async fn create_account_with_balance(t: &TestLedger, balance: i64) -> Uuid {
    let user = Uuid::new_v4();
    t.repo
        .find_or_create_account(user)
        .await
        .expect("Failed to create account");

    if balance > 0 {
        t.ledger
            .credit(user, balance, EntryKind::Bonus, "Seed balance")
            .await
            .expect("Failed to seed balance");
    }

    user
}

/// Assert the ledger/balance invariant: balance equals the sum of completed
/// entry deltas
pub async fn assert_reconciled(t: &TestLedger, user: Uuid) {
    let summary = t
        .ledger
        .account_summary(user)
        .await
        .expect("Failed to load account summary");

    assert!(
        summary.is_reconciled(),
        "balance {} diverged from ledger total {}",
        summary.account.balance,
        summary.ledger_total
    );
}

/// Repository wrapper that injects transient failures before delegating.
///
/// Counts delegated calls so tests can assert the retry policy (one retry
/// for transient failures, none for terminal errors).
pub struct FlakyRepository {
    inner: InMemoryLedgerRepository,
    failures_left: AtomicUsize,
    calls: AtomicUsize,
}

impl FlakyRepository {
    pub fn failing_times(failures: usize) -> Self {
        Self {
            inner: InMemoryLedgerRepository::new(),
            failures_left: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &InMemoryLedgerRepository {
        &self.inner
    }

    fn gate(&self) -> Result<(), LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let took_failure = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
            .is_ok();

        if took_failure {
            Err(LedgerError::StoreUnavailable(
                "injected transient failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LedgerRepository for FlakyRepository {
    async fn find_or_create_account(
        &self,
        user_id: Uuid,
    ) -> Result<(Account, bool), LedgerError> {
        self.gate()?;
        self.inner.find_or_create_account(user_id).await
    }

    async fn find_account(&self, user_id: Uuid) -> Result<Option<Account>, LedgerError> {
        self.gate()?;
        self.inner.find_account(user_id).await
    }

    async fn deactivate_account(&self, user_id: Uuid) -> Result<Account, LedgerError> {
        self.gate()?;
        self.inner.deactivate_account(user_id).await
    }

    async fn apply_delta(
        &self,
        user_id: Uuid,
        delta: i64,
        kind: EntryKind,
        description: Option<&str>,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        self.gate()?;
        self.inner.apply_delta(user_id, delta, kind, description).await
    }

    async fn apply_daily_bonus(
        &self,
        user_id: Uuid,
        amount: i64,
        day_start: NaiveDateTime,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        self.gate()?;
        self.inner.apply_daily_bonus(user_id, amount, day_start).await
    }

    async fn insert_pending_entry(
        &self,
        user_id: Uuid,
        delta: i64,
        kind: EntryKind,
        description: Option<&str>,
    ) -> Result<LedgerEntry, LedgerError> {
        self.gate()?;
        self.inner
            .insert_pending_entry(user_id, delta, kind, description)
            .await
    }

    async fn settle_pending_entry(
        &self,
        entry_id: i64,
        success: bool,
    ) -> Result<(Account, LedgerEntry), LedgerError> {
        self.gate()?;
        self.inner.settle_pending_entry(entry_id, success).await
    }

    async fn list_entries(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.gate()?;
        self.inner.list_entries(user_id, limit, offset).await
    }

    async fn completed_delta_sum(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        self.gate()?;
        self.inner.completed_delta_sum(user_id).await
    }
}
