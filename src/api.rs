//! Typed request/response surface for the coin endpoints.
//!
//! Transport and auth belong to the platform's API tier; this module defines
//! the wire shapes and maps ledger outcomes onto status-coded responses, so
//! every mounting layer serves identical payloads.

use crate::error::LedgerError;
use crate::models::{CoinPackage, EntryKind, LedgerEntry};
use crate::services::LedgerService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Default transaction page size when the query omits `limit`
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Machine-readable error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// A status-coded error ready for the transport layer
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,
    pub body: ErrorResponse,
}

impl ApiError {
    fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: ErrorResponse {
                error: code.to_string(),
                message: message.into(),
            },
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if let LedgerError::StoreUnavailable(_) = &err {
            error!("Store failure surfaced to caller: {}", err);
        }

        Self {
            status: err.status_code(),
            body: ErrorResponse {
                error: err.code().to_string(),
                message: err.to_string(),
            },
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseCoinsRequest {
    pub package_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamDebitRequest {
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingCreditRequest {
    pub kind: String,
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingCreditResponse {
    pub entry: LedgerEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyBonusResponse {
    pub success: bool,
    pub coins_added: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseCoinsResponse {
    pub success: bool,
    pub coins: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsResponse {
    pub data: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub balance: i64,
}

/// Handlers for the coin endpoints; the authenticated `user_id` comes from
/// the caller's auth context
pub struct CoinsApi {
    ledger: Arc<LedgerService>,
}

impl CoinsApi {
    pub fn new(ledger: Arc<LedgerService>) -> Self {
        Self { ledger }
    }

    /// POST /coins/daily-bonus
    pub async fn claim_daily_bonus(&self, user_id: Uuid) -> ApiResult<DailyBonusResponse> {
        let grant = self.ledger.claim_daily_bonus(user_id).await?;

        Ok(DailyBonusResponse {
            success: true,
            coins_added: grant.coins_added,
            balance: grant.account.balance,
        })
    }

    /// POST /coins/purchase
    pub async fn purchase_coins(
        &self,
        user_id: Uuid,
        request: PurchaseCoinsRequest,
    ) -> ApiResult<PurchaseCoinsResponse> {
        let package = CoinPackage::from_str(&request.package_type).ok_or_else(|| {
            ApiError::bad_request(
                "invalid_package",
                format!("Unknown coin package: {}", request.package_type),
            )
        })?;

        let account = self.ledger.purchase_coins(user_id, package).await?;

        Ok(PurchaseCoinsResponse {
            success: true,
            coins: package.coins(),
            balance: account.balance,
        })
    }

    /// GET /coins/transactions?page&limit
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        query: TransactionsQuery,
    ) -> ApiResult<TransactionsResponse> {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        let data = self.ledger.list_transactions(user_id, page, limit).await?;

        Ok(TransactionsResponse { data })
    }

    /// POST /coins/deposits: record a credit awaiting gateway confirmation
    pub async fn begin_pending_credit(
        &self,
        user_id: Uuid,
        request: PendingCreditRequest,
    ) -> ApiResult<PendingCreditResponse> {
        let kind = EntryKind::from_str(&request.kind)
            .ok_or_else(|| ApiError::from(LedgerError::InvalidKind(request.kind.clone())))?;

        let entry = self
            .ledger
            .begin_pending_credit(user_id, request.amount, kind, &request.description)
            .await?;

        Ok(PendingCreditResponse { entry })
    }

    /// Internal call from the content-access check
    pub async fn debit_stream_access(
        &self,
        request: StreamDebitRequest,
    ) -> ApiResult<BalanceResponse> {
        let account = self
            .ledger
            .charge_stream_access(request.user_id, request.amount, &request.description)
            .await?;

        Ok(BalanceResponse {
            user_id: account.user_id,
            balance: account.balance,
        })
    }
}
