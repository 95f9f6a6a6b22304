use std::sync::Arc;

use api_gateway::{router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use ledger_service::LedgerService;
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing::Level;

async fn app() -> Router {
    let ledger = LedgerService::new().unwrap();
    ledger.initialize().await.unwrap();
    router(Arc::new(AppState { ledger: Arc::new(ledger) }), Level::DEBUG)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_client(app: &Router, client_id: &str) {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/v1/clients/create",
        Some(json!({
            "client_id": client_id,
            "nombre": "Ana",
            "apellidos": "Gomez",
            "ciudad": "Bogota",
            "email": "ana@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_funds_endpoints() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/api/v1/funds", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(body["funds"][0]["name"], "FPV_EL CLIENTE_RECAUDADORA");
    assert_eq!(body["funds"][0]["type"], "FPV");
    assert_eq!(body["funds"][0]["min_amount"], "75000");
    assert_eq!(body["funds"][0]["risk_level"], "BAJO");

    let (status, body) = call(&app, Method::GET, "/api/v1/funds/4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fund"]["name"], "FDO-ACCIONES");

    let (status, body) = call(&app, Method::GET, "/api/v1/funds/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "not_found");
}

#[tokio::test]
async fn test_create_client_and_lookup() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/clients/create",
        Some(json!({
            "client_id": "C1",
            "name": "Ana",
            "surname": "Gomez",
            "city": "Bogota",
            "phone": "+573001112233"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["balance"], "500000");
    assert_eq!(body["transaction"]["transaction_type"], "SALDO_INICIAL");
    assert_eq!(body["client"]["surname"], "Gomez");

    let (status, body) = call(&app, Method::GET, "/api/v1/clients/C1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client"]["phone"], "+573001112233");

    let (status, _) = call(&app, Method::GET, "/api/v1/clients/C2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, Method::GET, "/api/v1/clients", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_duplicate_client_is_rejected() {
    let app = app().await;
    create_client(&app, "C1").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/clients/create",
        Some(json!({"client_id": "C1", "name": "B", "surname": "C", "city": "D"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "already_exists");
    assert_eq!(body["message"], "Client C1 already exists");
}

#[tokio::test]
async fn test_create_client_validation() {
    let app = app().await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/clients/create",
        Some(json!({"client_id": " ", "name": "", "surname": "Gomez", "city": "Bogota", "email": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid data");
    assert!(body["errors"]["client_id"].is_array());
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"].get("city").is_none());
}

#[tokio::test]
async fn test_deposit() {
    let app = app().await;
    create_client(&app, "C1").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/deposit",
        Some(json!({"client_id": "C1", "amount": "100000"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["new_balance"], "600000");
    assert_eq!(body["transaction"]["fund_id"], "DEPOSIT");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/deposit",
        Some(json!({"client_id": "C1", "amount": "-5"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_amount");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/deposit",
        Some(json!({"client_id": "C1", "amount": "10.001"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["amount"].is_array());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/deposit",
        Some(json!({"client_id": "ghost", "amount": "10"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "not_found");
}

#[tokio::test]
async fn test_subscribe_and_cancel() {
    let app = app().await;
    create_client(&app, "C1").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/subscribe",
        Some(json!({"client_id": "C1", "fund_id": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["subscription"]["amount"], "75000");
    assert_eq!(body["new_balance"], "425000");

    let (status, body) = call(&app, Method::GET, "/api/v1/clients/C1/balance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_balance"], "425000");
    assert_eq!(body["total_subscribed_funds"], 1);
    assert_eq!(body["subscribed_funds"][0]["fund_name"], "FPV_EL CLIENTE_RECAUDADORA");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/subscribe",
        Some(json!({"client_id": "C1", "fund_id": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "already_exists");
    assert_eq!(body["fund_info"]["fund_id"], "1");
    assert_eq!(body["existing_subscription"]["amount"], "75000");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/cancel",
        Some(json!({"client_id": "C1", "fund_id": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refunded_amount"], "75000");
    assert_eq!(body["new_balance"], "500000");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/cancel",
        Some(json!({"client_id": "C1", "fund_id": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "not_found");

    let (status, body) = call(&app, Method::GET, "/api/v1/clients/C1/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    let (status, body) = call(&app, Method::GET, "/api/v1/clients/C1/subscriptions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, body) = call(&app, Method::GET, "/api/v1/clients/C1/audit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["consistent"], true);
}

#[tokio::test]
async fn test_insufficient_funds_payload() {
    let app = app().await;
    create_client(&app, "C1").await;

    for fund_id in ["4", "2", "5"] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/subscribe",
            Some(json!({"client_id": "C1", "fund_id": fund_id})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/subscribe",
        Some(json!({"client_id": "C1", "fund_id": "3"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "insufficient_funds");
    assert_eq!(body["required_amount"], "50000");
    assert_eq!(body["current_balance"], "25000");
    assert_eq!(body["missing_amount"], "25000");
}

#[tokio::test]
async fn test_initialize_endpoint() {
    let app = app().await;

    let (status, body) = call(&app, Method::POST, "/api/v1/initialize", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["funds_loaded"], 5);
    assert_eq!(body["table_created"], false);
}
