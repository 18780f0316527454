use std::env;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Coin economy and ledger operation configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Coins granted once at account creation
    pub welcome_grant: i64,
    /// Coins credited by the once-per-day bonus
    pub daily_bonus: i64,
    /// Coins credited to the referrer on a referred signup
    pub referral_bounty: i64,
    /// Coins credited to the referred user on signup
    pub referral_signup_bonus: i64,
    /// Per-operation timeout against the persistent store
    pub op_timeout_ms: u64,
    /// Backoff before the single retry of a transient store failure
    pub retry_backoff_ms: u64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub ledger: LedgerConfig,
    pub log_level: String,
    pub environment: String,
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL environment variable is required")?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let acquire_timeout_secs = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_secs = env::var("DATABASE_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(600);

        let max_lifetime_secs = env::var("DATABASE_MAX_LIFETIME_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1800);

        let test_before_acquire = env::var("DATABASE_TEST_BEFORE_ACQUIRE")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(true);

        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/bulldog".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl LedgerConfig {
    /// Create ledger config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let welcome_grant = env::var("COINS_WELCOME_GRANT")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(100);

        let daily_bonus = env::var("COINS_DAILY_BONUS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(50);

        let referral_bounty = env::var("COINS_REFERRAL_BOUNTY")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(500);

        let referral_signup_bonus = env::var("COINS_REFERRAL_SIGNUP_BONUS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(250);

        let op_timeout_ms = env::var("LEDGER_OP_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(5_000);

        let retry_backoff_ms = env::var("LEDGER_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(100);

        if welcome_grant < 0 || daily_bonus <= 0 {
            return Err("Coin grant amounts must be positive".to_string());
        }

        if referral_bounty <= 0 || referral_signup_bonus <= 0 {
            return Err("Referral bonus amounts must be positive".to_string());
        }

        if op_timeout_ms == 0 {
            return Err("LEDGER_OP_TIMEOUT_MS must be greater than 0".to_string());
        }

        Ok(Self {
            welcome_grant,
            daily_bonus,
            referral_bounty,
            referral_signup_bonus,
            op_timeout_ms,
            retry_backoff_ms,
        })
    }

    /// Get per-operation store timeout as Duration
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Get retry backoff as Duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            welcome_grant: 100,
            daily_bonus: 50,
            referral_bounty: 500,
            referral_signup_bonus: 250,
            op_timeout_ms: 5_000,
            retry_backoff_ms: 100,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;
        let ledger = LedgerConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        Ok(Self {
            database,
            ledger,
            log_level: log_level.to_lowercase(),
            environment: environment.to_lowercase(),
        })
    }

    /// Load a `.env` file if present, then read the environment
    pub fn load() -> Result<Self, String> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            ledger: LedgerConfig::default(),
            log_level: "info".to_string(),
            environment: "development".to_string(),
        }
    }
}
