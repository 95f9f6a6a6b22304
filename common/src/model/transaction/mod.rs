//! Transaction log models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Fund ID recorded on the opening-grant transaction
pub const INITIAL_BALANCE_FUND_ID: &str = "INITIAL_BALANCE";

/// Fund ID recorded on deposit transactions
pub const DEPOSIT_FUND_ID: &str = "DEPOSIT";

/// Status written on every transaction
pub const STATUS_COMPLETED: &str = "completed";

/// Transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum TransactionType {
    /// Opening grant
    #[serde(rename = "SALDO_INICIAL")]
    InitialBalance,
    /// Cash deposit
    #[serde(rename = "DEPOSITO")]
    Deposit,
    /// Fund subscription (debit)
    #[serde(rename = "subscription")]
    Subscription,
    /// Subscription cancellation (refund)
    #[serde(rename = "cancellation")]
    Cancellation,
}

impl TransactionType {
    /// Wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::InitialBalance => "SALDO_INICIAL",
            TransactionType::Deposit => "DEPOSITO",
            TransactionType::Subscription => "subscription",
            TransactionType::Cancellation => "cancellation",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALDO_INICIAL" => Ok(TransactionType::InitialBalance),
            "DEPOSITO" => Ok(TransactionType::Deposit),
            "subscription" => Ok(TransactionType::Subscription),
            "cancellation" => Ok(TransactionType::Cancellation),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Transaction {
    /// Generated transaction ID
    pub transaction_id: String,
    /// Client ID
    pub client_id: String,
    /// Fund ID, or a sentinel for non-fund movements
    pub fund_id: String,
    /// Amount moved (always positive)
    pub amount: Amount,
    /// Transaction type
    pub transaction_type: TransactionType,
    /// Status
    pub status: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new completed transaction with a fresh ID
    pub fn new(
        client_id: impl Into<String>,
        fund_id: impl Into<String>,
        amount: Amount,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            transaction_id: Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            fund_id: fund_id.into(),
            amount,
            transaction_type,
            status: STATUS_COMPLETED.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn initial_balance(client_id: impl Into<String>, amount: Amount) -> Self {
        Self::new(client_id, INITIAL_BALANCE_FUND_ID, amount, TransactionType::InitialBalance)
    }

    pub fn deposit(client_id: impl Into<String>, amount: Amount) -> Self {
        Self::new(client_id, DEPOSIT_FUND_ID, amount, TransactionType::Deposit)
    }

    pub fn subscription(client_id: impl Into<String>, fund_id: impl Into<String>, amount: Amount) -> Self {
        Self::new(client_id, fund_id, amount, TransactionType::Subscription)
    }

    pub fn cancellation(client_id: impl Into<String>, fund_id: impl Into<String>, amount: Amount) -> Self {
        Self::new(client_id, fund_id, amount, TransactionType::Cancellation)
    }

    /// Effect of this entry on the client's cash balance
    pub fn balance_effect(&self) -> Amount {
        match self.transaction_type {
            TransactionType::Subscription => -self.amount,
            TransactionType::InitialBalance
            | TransactionType::Deposit
            | TransactionType::Cancellation => self.amount,
        }
    }
}
