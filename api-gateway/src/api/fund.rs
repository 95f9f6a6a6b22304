//! Fund API handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use common::model::Fund;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct FundsPayload {
    pub funds: Vec<Fund>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FundPayload {
    pub fund: Fund,
}

/// List every available fund
#[utoipa::path(
    get,
    path = "/api/v1/funds",
    responses(
        (status = 200, description = "Funds retrieved", body = FundsPayload),
        (status = 500, description = "Internal server error")
    ),
    tag = "fund"
)]
pub async fn list_funds(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<FundsPayload>, ApiError> {
    let funds = state.ledger.list_funds().await?;

    Ok(ApiResponse::new(FundsPayload {
        count: funds.len(),
        funds,
    }))
}

/// Get a fund by ID
#[utoipa::path(
    get,
    path = "/api/v1/funds/{fund_id}",
    params(
        ("fund_id" = String, Path, description = "Fund ID")
    ),
    responses(
        (status = 200, description = "Fund retrieved", body = FundPayload),
        (status = 404, description = "Fund not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "fund"
)]
pub async fn get_fund(
    State(state): State<Arc<AppState>>,
    Path(fund_id): Path<String>,
) -> Result<ApiResponse<FundPayload>, ApiError> {
    let fund = state
        .ledger
        .get_fund(&fund_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Fund {} not found", fund_id)))?;

    Ok(ApiResponse::new(FundPayload { fund }))
}
