//! Response envelope
//!
//! Every successful body carries `success: true`, an optional `message`,
//! and the payload fields merged in at the top level.

use std::fmt::Debug;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Successful response: status code plus envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always true
    pub success: bool,
    /// Optional human-readable summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload fields
    #[serde(flatten)]
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T> ApiResponse<T> {
    /// 200 response
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            status: StatusCode::OK,
        }
    }

    /// 201 response
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::new(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
