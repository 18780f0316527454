//! Bulldog Stream Coin Ledger
//!
//! This crate owns per-user coin balances and their append-only transaction
//! log for the Bulldog Stream platform. It is consumed as a library by the
//! platform's API tier; transport and auth live there, the ledger's
//! consistency guarantees live here.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, LedgerError};

use config::LedgerConfig;
use database::Database;
use repositories::{LedgerRepository, PgLedgerRepository};
use services::LedgerService;
use std::sync::Arc;

/// Application state wiring the ledger over its production store
pub struct AppState {
    pub database: Database,
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    /// Create an AppState over an existing pool
    pub fn new(pool: sqlx::PgPool, ledger_config: LedgerConfig) -> Self {
        let database = Database::new(pool.clone());
        let repo: Arc<dyn LedgerRepository> = Arc::new(PgLedgerRepository::new(pool));

        Self {
            database,
            ledger: Arc::new(LedgerService::new(repo, ledger_config)),
        }
    }

    /// Connect to the database, run migrations and wire the ledger
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        let pool = database::create_pool(&config.database).await?;
        database::run_migrations(&pool, None).await?;

        Ok(Self::new(pool, config.ledger.clone()))
    }
}
