//! API handlers
//!
//! This module contains all the API endpoint handlers organized by resource.
//! Each handler follows a consistent pattern:
//! - Extract state and parameters using Axum extractors
//! - Validate the request body
//! - Call the ledger service
//! - Map the result to the response envelope

pub mod client;
pub mod fund;
pub mod response;
pub mod subscription;
pub mod system;
pub mod validation;

pub use response::ApiResponse;
