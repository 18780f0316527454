mod helpers;

use bulldog_backend::api::{
    PendingCreditRequest, PurchaseCoinsRequest, StreamDebitRequest, TransactionsQuery,
};
use helpers::*;
use uuid::Uuid;

#[tokio::test]
async fn test_daily_bonus_endpoint_shapes() {
    let t = TestLedger::new();
    let user = create_account_with_balance(&t, 0).await;

    let response = t.api.claim_daily_bonus(user).await.unwrap();
    assert!(response.success);
    assert_eq!(response.coins_added, 50);
    assert_eq!(response.balance, 50);

    let err = t.api.claim_daily_bonus(user).await.unwrap_err();
    assert_eq!(err.status, 409);
    assert_eq!(err.body.error, "already_claimed");
}

#[tokio::test]
async fn test_purchase_endpoint_resolves_packages() {
    let t = TestLedger::new();
    let user = Uuid::new_v4();
    t.ledger.register_account(user).await.unwrap();

    let response = t
        .api
        .purchase_coins(
            user,
            PurchaseCoinsRequest {
                package_type: "standard".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.coins, 1200);
    assert_eq!(response.balance, 1300);

    let err = t
        .api
        .purchase_coins(
            user,
            PurchaseCoinsRequest {
                package_type: "whale".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.body.error, "invalid_package");
}

#[tokio::test]
async fn test_transactions_endpoint_defaults_and_pages() {
    let t = TestLedger::new();
    let user = Uuid::new_v4();
    t.ledger.register_account(user).await.unwrap();
    t.api.claim_daily_bonus(user).await.unwrap();

    let response = t
        .api
        .list_transactions(user, TransactionsQuery::default())
        .await
        .unwrap();
    assert_eq!(response.data.len(), 2);
    // Newest first: the bonus claim precedes the welcome grant
    assert_eq!(response.data[0].kind, "daily_bonus");

    let response = t
        .api
        .list_transactions(
            user,
            TransactionsQuery {
                page: Some(2),
                limit: Some(1),
            },
        )
        .await
        .unwrap();
    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].kind, "bonus");
}

#[tokio::test]
async fn test_pending_credit_endpoint_rejects_unknown_kind() {
    let t = TestLedger::new();
    let user = create_account_with_balance(&t, 0).await;

    let response = t
        .api
        .begin_pending_credit(
            user,
            PendingCreditRequest {
                kind: "purchase".to_string(),
                amount: 300,
                description: "BTC deposit".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(response.entry.status, "pending");

    let err = t
        .api
        .begin_pending_credit(
            user,
            PendingCreditRequest {
                kind: "jackpot".to_string(),
                amount: 300,
                description: "BTC deposit".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.body.error, "invalid_kind");
}

#[tokio::test]
async fn test_stream_debit_endpoint_maps_errors() {
    let t = TestLedger::new();
    let user = create_account_with_balance(&t, 100).await;

    let response = t
        .api
        .debit_stream_access(StreamDebitRequest {
            user_id: user,
            amount: 60,
            description: "Watched Premium Sports".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(response.balance, 40);

    let err = t
        .api
        .debit_stream_access(StreamDebitRequest {
            user_id: user,
            amount: 60,
            description: "Watched Premium Sports".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status, 403);
    assert_eq!(err.body.error, "insufficient_balance");

    let err = t
        .api
        .debit_stream_access(StreamDebitRequest {
            user_id: Uuid::new_v4(),
            amount: 10,
            description: "Watched".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status, 404);
    assert_eq!(err.body.error, "account_not_found");
}
