//! Inputs and results of ledger operations

use chrono::{DateTime, Utc};
use common::decimal::Amount;
use common::model::{Client, ClientBalance, ClientFundSubscription, Transaction};
use serde::{Deserialize, Serialize};
#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

/// Data needed to open a client account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct NewClient {
    pub client_id: String,
    pub name: String,
    pub surname: String,
    pub city: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Everything written when a client is created
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ClientCreation {
    pub client: Client,
    pub balance: ClientBalance,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct DepositReceipt {
    pub client_id: String,
    pub amount: Amount,
    pub new_balance: Amount,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct SubscriptionReceipt {
    pub subscription: ClientFundSubscription,
    pub transaction: Transaction,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct CancellationReceipt {
    pub client_id: String,
    pub fund_id: String,
    pub refunded_amount: Amount,
    pub new_balance: Amount,
    pub transaction: Transaction,
}

/// An active subscription joined with its fund
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct SubscribedFund {
    pub fund_id: String,
    pub fund_name: String,
    pub fund_type: String,
    pub subscribed_amount: Amount,
    pub subscription_date: DateTime<Utc>,
}

/// Balance together with the funds it is committed to
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct BalanceOverview {
    pub client_id: String,
    pub available_balance: Amount,
    pub subscribed_funds: Vec<SubscribedFund>,
    pub total_subscribed_funds: usize,
    pub updated_at: DateTime<Utc>,
}

/// Stored balance compared with the balance implied by the transaction log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct BalanceAudit {
    pub client_id: String,
    pub stored_balance: Amount,
    pub ledger_balance: Amount,
    pub transaction_count: usize,
    pub consistent: bool,
}

/// Outcome of table setup and catalog seeding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct InitializationReport {
    pub table_created: bool,
    pub funds_loaded: usize,
}
