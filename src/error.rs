use crate::database::DatabaseError;
use sqlx::Error as SqlxError;
use thiserror::Error;
use uuid::Uuid;

/// Domain errors for coin ledger operations.
///
/// Every variant carries a stable machine-readable code surfaced to callers;
/// none of these should be collapsed into a generic failure.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Account does not exist or has been deactivated
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Amount was zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// Debit would drive the balance negative
    #[error("Insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: i64, required: i64 },

    /// Daily bonus already claimed within the current UTC day
    #[error("Daily bonus already claimed today")]
    AlreadyClaimed,

    /// Unrecognized transaction kind
    #[error("Invalid transaction kind: {0}")]
    InvalidKind(String),

    /// No pending ledger entry with this id
    #[error("No pending ledger entry: {0}")]
    EntryNotFound(i64),

    /// Transient infrastructure failure talking to the persistent store
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AccountNotFound(_) => "account_not_found",
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::AlreadyClaimed => "already_claimed",
            LedgerError::InvalidKind(_) => "invalid_kind",
            LedgerError::EntryNotFound(_) => "entry_not_found",
            LedgerError::StoreUnavailable(_) => "store_unavailable",
        }
    }

    /// HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            LedgerError::AccountNotFound(_) | LedgerError::EntryNotFound(_) => 404,
            LedgerError::InvalidAmount(_) | LedgerError::InvalidKind(_) => 400,
            LedgerError::InsufficientBalance { .. } => 403,
            LedgerError::AlreadyClaimed => 409,
            LedgerError::StoreUnavailable(_) => 503,
        }
    }

    /// Only transient store failures may be retried; retrying any other
    /// variant cannot succeed without new facts.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::StoreUnavailable(_))
    }
}

impl From<SqlxError> for LedgerError {
    fn from(err: SqlxError) -> Self {
        // Row-level outcomes (missing account, failed balance guard) are
        // distinguished at the query site; whatever reaches this conversion
        // is infrastructure failing underneath the ledger.
        LedgerError::StoreUnavailable(err.to_string())
    }
}

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Ledger domain errors
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database pool/migration errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors on request input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Ledger(e) => e.status_code(),
            AppError::Validation(_) => 400,
            AppError::Config(_) => 500,
            AppError::Database(_) => 500,
            AppError::Serialization(_) => 500,
        }
    }

    /// Machine-readable code surfaced alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Ledger(e) => e.code(),
            AppError::Validation(_) => "validation",
            AppError::Config(_) => "config",
            AppError::Database(_) => "database",
            AppError::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_codes() {
        let err = LedgerError::InsufficientBalance {
            balance: 10,
            required: 80,
        };
        assert_eq!(err.code(), "insufficient_balance");
        assert_eq!(err.status_code(), 403);
        assert!(!err.is_retryable());

        assert_eq!(LedgerError::AlreadyClaimed.status_code(), 409);
        assert!(LedgerError::StoreUnavailable("timeout".into()).is_retryable());
    }

    #[test]
    fn test_app_error_delegates_to_ledger() {
        let err = AppError::from(LedgerError::InvalidAmount(-5));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.code(), "invalid_amount");
    }
}
