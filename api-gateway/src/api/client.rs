//! Client API handlers
//!
//! Handles endpoints related to client accounts:
//! - Create and look up clients
//! - Balance overview, subscriptions and transaction history
//! - Deposits and balance audits

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::decimal::Amount;
use common::model::{Client, ClientFundSubscription, Transaction};
use ledger_service::{BalanceAudit, BalanceOverview, NewClient};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::api::validation::Validator;
use crate::error::ApiError;
use crate::AppState;

/// Create client request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateClientRequest {
    pub client_id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "apellidos")]
    pub surname: String,
    #[serde(alias = "ciudad")]
    pub city: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CreateClientRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .required("client_id", &self.client_id, 50)
            .required("name", &self.name, 100)
            .required("surname", &self.surname, 100)
            .required("city", &self.city, 100)
            .email("email", self.email.as_deref())
            .finish()
    }
}

/// Deposit request
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    pub client_id: String,
    pub amount: Amount,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientCreatedPayload {
    pub client: Client,
    pub balance: Amount,
    pub transaction: Transaction,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientPayload {
    pub client: Client,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientsPayload {
    pub clients: Vec<Client>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionsPayload {
    pub subscriptions: Vec<ClientFundSubscription>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionsPayload {
    pub transactions: Vec<Transaction>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepositPayload {
    pub new_balance: Amount,
    pub transaction: Transaction,
}

/// Create a client with the initial balance
#[utoipa::path(
    post,
    path = "/api/v1/clients/create",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientCreatedPayload),
        (status = 400, description = "Invalid data or client already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "client"
)]
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateClientRequest>,
) -> Result<ApiResponse<ClientCreatedPayload>, ApiError> {
    request.validate()?;

    let created = state
        .ledger
        .create_client(NewClient {
            client_id: request.client_id.trim().to_string(),
            name: request.name,
            surname: request.surname,
            city: request.city,
            email: request.email,
            phone: request.phone,
        })
        .await?;

    let message = format!(
        "Client {} created with an initial balance of {}",
        created.client.client_id, created.balance.balance
    );
    Ok(ApiResponse::created(ClientCreatedPayload {
        client: created.client,
        balance: created.balance.balance,
        transaction: created.transaction,
    })
    .with_message(message))
}

/// List every client
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    responses(
        (status = 200, description = "Clients retrieved", body = ClientsPayload),
        (status = 500, description = "Internal server error")
    ),
    tag = "client"
)]
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<ClientsPayload>, ApiError> {
    let clients = state.ledger.list_clients().await?;

    Ok(ApiResponse::new(ClientsPayload {
        count: clients.len(),
        clients,
    }))
}

/// Get a client by ID
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}",
    params(
        ("client_id" = String, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Client retrieved", body = ClientPayload),
        (status = 404, description = "Client not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "client"
)]
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<ApiResponse<ClientPayload>, ApiError> {
    let client = state
        .ledger
        .get_client(&client_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Client {} not found", client_id)))?;

    Ok(ApiResponse::new(ClientPayload { client }))
}

/// Balance and active subscriptions of a client
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/balance",
    params(
        ("client_id" = String, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Balance retrieved", body = BalanceOverview),
        (status = 500, description = "Internal server error")
    ),
    tag = "client"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<ApiResponse<BalanceOverview>, ApiError> {
    let overview = state.ledger.get_balance_overview(&client_id).await?;
    Ok(ApiResponse::new(overview))
}

/// Active subscriptions of a client
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/subscriptions",
    params(
        ("client_id" = String, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Subscriptions retrieved", body = SubscriptionsPayload),
        (status = 500, description = "Internal server error")
    ),
    tag = "client"
)]
pub async fn get_subscriptions(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<ApiResponse<SubscriptionsPayload>, ApiError> {
    let subscriptions = state.ledger.list_subscriptions(&client_id).await?;

    Ok(ApiResponse::new(SubscriptionsPayload {
        count: subscriptions.len(),
        subscriptions,
    }))
}

/// Transaction history of a client, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/transactions",
    params(
        ("client_id" = String, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Transactions retrieved", body = TransactionsPayload),
        (status = 500, description = "Internal server error")
    ),
    tag = "client"
)]
pub async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<ApiResponse<TransactionsPayload>, ApiError> {
    let transactions = state.ledger.list_transactions(&client_id).await?;

    Ok(ApiResponse::new(TransactionsPayload {
        count: transactions.len(),
        transactions,
    }))
}

/// Check a client's balance against its transaction log
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/audit",
    params(
        ("client_id" = String, Path, description = "Client ID")
    ),
    responses(
        (status = 200, description = "Audit computed", body = BalanceAudit),
        (status = 500, description = "Internal server error")
    ),
    tag = "client"
)]
pub async fn audit_balance(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<ApiResponse<BalanceAudit>, ApiError> {
    let audit = state.ledger.audit_balance(&client_id).await?;
    Ok(ApiResponse::new(audit))
}

/// Deposit cash into a client's balance
#[utoipa::path(
    post,
    path = "/api/v1/deposit",
    request_body = DepositRequest,
    responses(
        (status = 201, description = "Deposit completed", body = DepositPayload),
        (status = 400, description = "Invalid data, unknown client or non-positive amount"),
        (status = 500, description = "Internal server error")
    ),
    tag = "client"
)]
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DepositRequest>,
) -> Result<ApiResponse<DepositPayload>, ApiError> {
    Validator::new()
        .required("client_id", &request.client_id, 50)
        .amount("amount", request.amount)
        .finish()?;

    let receipt = state.ledger.deposit(request.client_id.trim(), request.amount).await?;

    let message = format!("Deposit of {} completed", receipt.amount);
    Ok(ApiResponse::created(DepositPayload {
        new_balance: receipt.new_balance,
        transaction: receipt.transaction,
    })
    .with_message(message))
}
