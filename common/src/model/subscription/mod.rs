//! Fund subscription models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Active subscription of a client to a fund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ClientFundSubscription {
    /// Client ID
    pub client_id: String,
    /// Fund ID
    pub fund_id: String,
    /// Amount debited at subscription time
    pub amount: Amount,
    /// Subscription timestamp
    pub subscription_date: DateTime<Utc>,
}

impl ClientFundSubscription {
    pub fn new(client_id: impl Into<String>, fund_id: impl Into<String>, amount: Amount) -> Self {
        Self {
            client_id: client_id.into(),
            fund_id: fund_id.into(),
            amount,
            subscription_date: Utc::now(),
        }
    }
}

/// Summary of an existing subscription, reported when a duplicate is rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ExistingSubscription {
    pub amount: Amount,
    pub subscription_date: DateTime<Utc>,
}

impl From<&ClientFundSubscription> for ExistingSubscription {
    fn from(subscription: &ClientFundSubscription) -> Self {
        Self {
            amount: subscription.amount,
            subscription_date: subscription.subscription_date,
        }
    }
}
