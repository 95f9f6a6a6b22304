//! Health and setup handlers

use std::sync::Arc;

use axum::extract::State;
use ledger_service::InitializationReport;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthPayload {
    pub status: String,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "API is running", body = HealthPayload)
    ),
    tag = "system"
)]
pub async fn health() -> ApiResponse<HealthPayload> {
    ApiResponse::new(HealthPayload {
        status: "healthy".to_string(),
    })
    .with_message("API is running")
}

/// Create the table and load the fund catalog
#[utoipa::path(
    post,
    path = "/api/v1/initialize",
    responses(
        (status = 201, description = "System initialized", body = InitializationReport),
        (status = 500, description = "Internal server error")
    ),
    tag = "system"
)]
pub async fn initialize(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<InitializationReport>, ApiError> {
    let report = state.ledger.initialize().await?;

    let message = format!("System initialized. {} funds loaded.", report.funds_loaded);
    Ok(ApiResponse::created(report).with_message(message))
}
