//! Subscription API handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use common::decimal::Amount;
use common::model::{ClientFundSubscription, Transaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::api::validation::Validator;
use crate::error::ApiError;
use crate::AppState;

/// Subscribe or cancel request
#[derive(Debug, Deserialize, ToSchema)]
pub struct FundRequest {
    pub client_id: String,
    pub fund_id: String,
}

impl FundRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .required("client_id", &self.client_id, 50)
            .required("fund_id", &self.fund_id, 50)
            .finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionPayload {
    pub subscription: ClientFundSubscription,
    pub transaction: Transaction,
    pub new_balance: Amount,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancellationPayload {
    pub transaction: Transaction,
    pub refunded_amount: Amount,
    pub new_balance: Amount,
}

/// Subscribe a client to a fund for the fund's minimum amount
#[utoipa::path(
    post,
    path = "/api/v1/subscribe",
    request_body = FundRequest,
    responses(
        (status = 201, description = "Subscription completed", body = SubscriptionPayload),
        (status = 400, description = "Invalid data, unknown client or fund, duplicate subscription or insufficient balance"),
        (status = 500, description = "Internal server error")
    ),
    tag = "subscription"
)]
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FundRequest>,
) -> Result<ApiResponse<SubscriptionPayload>, ApiError> {
    request.validate()?;

    let receipt = state
        .ledger
        .subscribe(request.client_id.trim(), request.fund_id.trim())
        .await?;

    let message = format!(
        "Subscribed to fund {} for {}",
        receipt.subscription.fund_id, receipt.subscription.amount
    );
    Ok(ApiResponse::created(SubscriptionPayload {
        subscription: receipt.subscription,
        transaction: receipt.transaction,
        new_balance: receipt.new_balance,
    })
    .with_message(message))
}

/// Cancel a subscription with a full refund
#[utoipa::path(
    post,
    path = "/api/v1/cancel",
    request_body = FundRequest,
    responses(
        (status = 200, description = "Subscription cancelled", body = CancellationPayload),
        (status = 400, description = "Invalid data, unknown fund or no active subscription"),
        (status = 500, description = "Internal server error")
    ),
    tag = "subscription"
)]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FundRequest>,
) -> Result<ApiResponse<CancellationPayload>, ApiError> {
    request.validate()?;

    let receipt = state
        .ledger
        .cancel(request.client_id.trim(), request.fund_id.trim())
        .await?;

    let message = format!(
        "Subscription to fund {} cancelled, {} refunded",
        receipt.fund_id, receipt.refunded_amount
    );
    Ok(ApiResponse::new(CancellationPayload {
        transaction: receipt.transaction,
        refunded_amount: receipt.refunded_amount,
        new_balance: receipt.new_balance,
    })
    .with_message(message))
}
