//! Common types and utilities for the fund ledger
//!
//! This library contains the pieces shared by the ledger service and the
//! HTTP gateway: the error taxonomy, the decimal amount type, the domain
//! models, the single-table key-value store contract and its backends, and
//! the codec that maps every entity onto that table.

pub mod error;
pub mod model;
pub mod decimal;
pub mod store;
pub mod codec;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, FailureContext};
pub use decimal::*;

// Re-export store types
pub use store::{AttributeValue, Condition, Item, KeyValueStore};
pub use codec::EntityCodec;

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
