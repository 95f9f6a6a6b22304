//! Error types for the fund ledger
//!
//! This module provides the error taxonomy shared by the store, the codec,
//! the ledger service and the HTTP gateway. Domain failures (not found,
//! duplicates, invalid amounts, insufficient funds) are expected outcomes and
//! carry a human-readable message plus, where useful, a structured
//! [`FailureContext`]. Store and decoding failures are unrecoverable for the
//! operation that hit them and propagate unchanged.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decimal::Amount;
use crate::model::fund::FundInfo;
use crate::model::subscription::ExistingSubscription;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Structured payload attached to subscription failures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct FailureContext {
    /// Fund the client tried to subscribe to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fund_info: Option<FundInfo>,
    /// Subscription that blocked a duplicate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_subscription: Option<ExistingSubscription>,
    /// Amount the operation needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_amount: Option<Amount>,
    /// Balance at the time of the check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<Amount>,
    /// required_amount - current_balance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_amount: Option<Amount>,
}

/// Fund ledger error type
#[derive(Debug, Error)]
pub enum Error {
    /// Client, fund or subscription missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate client or duplicate subscription
    #[error("Already exists: {message}")]
    AlreadyExists {
        message: String,
        context: Option<Box<FailureContext>>,
    },

    /// Non-positive or unrepresentable amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Balance below the amount an operation requires
    #[error("Insufficient funds: {message}")]
    InsufficientFunds {
        message: String,
        context: Box<FailureContext>,
    },

    /// Stored item lacks a required attribute or holds a bad value
    #[error("Malformed item: {0}")]
    MalformedItem(String),

    /// Transport-level store failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A conditional store write did not apply
    #[error("Condition failed: {0}")]
    ConditionFailed(String),

    /// Optimistic write retries exhausted
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal arithmetic overflow
    #[error("Decimal error: {0}")]
    DecimalError(String),
}

impl Error {
    /// Duplicate without extra payload
    pub fn already_exists(message: impl Into<String>) -> Self {
        Error::AlreadyExists {
            message: message.into(),
            context: None,
        }
    }

    /// Expected business outcome, as opposed to an operational failure
    pub fn is_domain_failure(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::AlreadyExists { .. }
                | Error::InvalidAmount(_)
                | Error::InsufficientFunds { .. }
        )
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Error::NotFound(msg)
            | Error::InvalidAmount(msg)
            | Error::MalformedItem(msg)
            | Error::StoreUnavailable(msg)
            | Error::ConditionFailed(msg)
            | Error::ConcurrentModification(msg)
            | Error::ConfigurationError(msg)
            | Error::Internal(msg)
            | Error::DecimalError(msg) => msg.clone(),
            Error::AlreadyExists { message, .. } | Error::InsufficientFunds { message, .. } => {
                message.clone()
            }
            Error::Serialization(e) => e.to_string(),
        }
    }

    /// Structured failure payload, if any
    pub fn context(&self) -> Option<&FailureContext> {
        match self {
            Error::AlreadyExists { context, .. } => context.as_deref(),
            Error::InsufficientFunds { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::NotFound(msg) => Error::NotFound(format!("{}: {}", context, msg)),
                Error::AlreadyExists { message, context: ctx } => Error::AlreadyExists {
                    message: format!("{}: {}", context, message),
                    context: ctx,
                },
                Error::InvalidAmount(msg) => Error::InvalidAmount(format!("{}: {}", context, msg)),
                Error::InsufficientFunds { message, context: ctx } => Error::InsufficientFunds {
                    message: format!("{}: {}", context, message),
                    context: ctx,
                },
                Error::MalformedItem(msg) => Error::MalformedItem(format!("{}: {}", context, msg)),
                Error::StoreUnavailable(msg) => Error::StoreUnavailable(format!("{}: {}", context, msg)),
                Error::ConditionFailed(msg) => Error::ConditionFailed(format!("{}: {}", context, msg)),
                Error::ConcurrentModification(msg) => {
                    Error::ConcurrentModification(format!("{}: {}", context, msg))
                }
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
            }
        })
    }
}

/// Every sqlx failure is a store transport failure from the ledger's point of view
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}
