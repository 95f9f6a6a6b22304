// End-to-end scenarios across the gateway, the ledger service and the store

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use fund_ledger::api_gateway::{router, AppState};
use fund_ledger::common::decimal::dec;
use fund_ledger::common::model::TransactionType;
use fund_ledger::ledger_service::{
    EventPublisher, FundCatalog, LedgerService, NotificationDispatcher, Notifier, Repositories,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing::Level;

#[derive(Default)]
struct RecordingNotifier {
    subjects: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, _client_id: &str, subject: &str, _message: &str) {
        self.subjects.lock().unwrap().push(subject.to_string());
    }
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_deposit_subscribe_cancel_scenario() {
    let repos = Repositories::in_memory();
    let (publisher, events) = EventPublisher::channel();
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher = NotificationDispatcher::new(notifier.clone()).spawn(events);

    let ledger = Arc::new(LedgerService::from_parts(
        repos,
        FundCatalog::embedded().unwrap(),
        publisher,
    ));
    ledger.initialize().await.unwrap();
    let app = router(Arc::new(AppState { ledger: ledger.clone() }), Level::INFO);

    let (status, body) = post(
        &app,
        "/api/v1/clients/create",
        json!({"client_id": "C1", "nombre": "Ana", "apellidos": "Gomez", "ciudad": "Bogota"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["balance"], "500000");

    let (status, body) = post(&app, "/api/v1/deposit", json!({"client_id": "C1", "amount": "100000"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["new_balance"], "600000");

    let (status, body) = post(&app, "/api/v1/subscribe", json!({"client_id": "C1", "fund_id": "1"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["new_balance"], "525000");
    assert_eq!(ledger.list_subscriptions("C1").await.unwrap().len(), 1);

    let (status, body) = post(&app, "/api/v1/cancel", json!({"client_id": "C1", "fund_id": "1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_balance"], "600000");
    assert_eq!(body["refunded_amount"], "75000");

    assert_eq!(ledger.get_balance("C1").await.unwrap().balance, dec!(600000));
    assert!(ledger.list_subscriptions("C1").await.unwrap().is_empty());

    let transactions = ledger.list_transactions("C1").await.unwrap();
    assert_eq!(transactions.len(), 4);
    let count = |kind: TransactionType| {
        transactions.iter().filter(|t| t.transaction_type == kind).count()
    };
    assert_eq!(count(TransactionType::InitialBalance), 1);
    assert_eq!(count(TransactionType::Deposit), 1);
    assert_eq!(count(TransactionType::Subscription), 1);
    assert_eq!(count(TransactionType::Cancellation), 1);

    let cancellation = transactions
        .iter()
        .find(|t| t.transaction_type == TransactionType::Cancellation)
        .unwrap();
    assert_eq!(cancellation.amount, dec!(75000));

    let audit = ledger.audit_balance("C1").await.unwrap();
    assert!(audit.consistent);

    // Dropping the last publisher ends the dispatcher once the queue is drained
    drop(app);
    drop(ledger);
    dispatcher.await.unwrap();

    let subjects = notifier.subjects.lock().unwrap().clone();
    assert_eq!(
        subjects,
        vec![
            "Welcome - your account was created",
            "Deposit received",
            "Fund subscription confirmed",
            "Fund subscription cancelled",
        ]
    );
}

#[tokio::test]
async fn test_failed_subscription_leaves_ledger_untouched() {
    let ledger = Arc::new(LedgerService::new().unwrap());
    ledger.initialize().await.unwrap();
    let app = router(Arc::new(AppState { ledger: ledger.clone() }), Level::INFO);

    post(
        &app,
        "/api/v1/clients/create",
        json!({"client_id": "C2", "name": "Luis", "surname": "Perez", "city": "Medellin"}),
    )
    .await;

    for fund_id in ["4", "2"] {
        let (status, _) = post(&app, "/api/v1/subscribe", json!({"client_id": "C2", "fund_id": fund_id})).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // 125000 left, fund 4 again is a duplicate and fund 5 costs 100000
    let (status, body) = post(&app, "/api/v1/subscribe", json!({"client_id": "C2", "fund_id": "4"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "already_exists");

    let (status, _) = post(&app, "/api/v1/subscribe", json!({"client_id": "C2", "fund_id": "5"})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(&app, "/api/v1/subscribe", json!({"client_id": "C2", "fund_id": "1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missing_amount"], "50000");

    assert_eq!(ledger.get_balance("C2").await.unwrap().balance, dec!(25000));
    assert_eq!(ledger.list_subscriptions("C2").await.unwrap().len(), 3);
    assert_eq!(ledger.list_transactions("C2").await.unwrap().len(), 4);
    assert!(ledger.audit_balance("C2").await.unwrap().consistent);
}
