//! Error handling for the API gateway

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::{Error, FailureContext};
use serde::Serialize;
use uuid::Uuid;

/// Field name to the problems found with it
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Error code (string identifier for the error type)
    pub error_code: String,
    /// Per-field validation problems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    /// Subscription failure details, merged into the body
    #[serde(flatten)]
    pub context: Option<FailureContext>,
    /// Request ID for tracing
    pub request_id: String,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid data")]
    Validation(FieldErrors),

    #[error("{0}")]
    Common(#[from] Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Common(e) => match e {
                // Domain failures (4xx)
                Error::NotFound(_) => (StatusCode::BAD_REQUEST, "not_found"),
                Error::AlreadyExists { .. } => (StatusCode::BAD_REQUEST, "already_exists"),
                Error::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
                Error::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "insufficient_funds"),
                Error::ConcurrentModification(_) => (StatusCode::CONFLICT, "concurrent_modification"),

                // Operational failures (5xx)
                Error::StoreUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_unavailable"),
                Error::MalformedItem(_) => (StatusCode::INTERNAL_SERVER_ERROR, "malformed_item"),
                Error::ConditionFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "condition_failed"),
                Error::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
                Error::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error"),
                Error::DecimalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "decimal_error"),
                Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();
        let (status, code) = self.parts();

        if status.is_server_error() {
            tracing::error!("API Error [{}]: {:?}", request_id, &self);
        } else {
            tracing::debug!("Request rejected [{}]: {}", request_id, &self);
        }

        let message = match &self {
            ApiError::Common(e) if e.is_domain_failure() => e.message(),
            other => other.to_string(),
        };

        let (errors, context) = match self {
            ApiError::Validation(errors) => (Some(errors), None),
            ApiError::Common(e) => (None, e.context().cloned()),
            ApiError::NotFound(_) => (None, None),
        };

        let error_response = ErrorResponse {
            success: false,
            message,
            error_code: code.to_string(),
            errors,
            context,
            request_id,
        };

        (status, Json(error_response)).into_response()
    }
}
