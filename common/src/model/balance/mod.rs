//! Client balance model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Running cash balance of a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ClientBalance {
    /// Client ID
    pub client_id: String,
    /// Available cash
    pub balance: Amount,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Write version: `None` until first stored, bumped by every stored update
    #[serde(default, skip_serializing)]
    pub version: Option<u64>,
}

impl ClientBalance {
    /// Create a balance that has never been stored
    pub fn new(client_id: impl Into<String>, balance: Amount) -> Self {
        Self {
            client_id: client_id.into(),
            balance,
            updated_at: Utc::now(),
            version: None,
        }
    }

    /// Add funds to the balance; fails without touching it on overflow
    pub fn credit(&mut self, amount: Amount) -> Result<()> {
        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            Error::DecimalError(format!(
                "Crediting {} to a balance of {} overflows",
                amount, self.balance
            ))
        })?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Remove funds from the balance
    pub fn debit(&mut self, amount: Amount) -> std::result::Result<(), String> {
        if amount > self.balance {
            return Err(format!(
                "Insufficient balance: {} available, {} required",
                self.balance, amount
            ));
        }

        self.balance -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Overwrite the balance with an absolute amount
    pub fn reset(&mut self, amount: Amount) {
        self.balance = amount;
        self.updated_at = Utc::now();
    }

    /// Whether the balance covers `amount`
    pub fn covers(&self, amount: Amount) -> bool {
        self.balance >= amount
    }
}
