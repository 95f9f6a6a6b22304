//! Entity codec
//!
//! Bidirectional mapping between the domain models and store items. Each
//! entity knows its own key (via [`keys`]) and attribute layout; decoding
//! fails with `MalformedItem` when a required attribute is missing, while
//! encoding never fails.

pub mod keys;

use rust_decimal::prelude::ToPrimitive;

use crate::error::{Error, Result};
use crate::model::{Client, ClientBalance, ClientFundSubscription, Fund, Transaction};
use crate::store::{AttributeValue, Item};

use keys::Key;

/// Mapping between an entity and its store item
pub trait EntityCodec: Sized {
    /// (pk, sk) the entity is stored under
    fn key(&self) -> Key;

    /// Encode into a full item, keys included
    fn to_item(&self) -> Item;

    /// Decode from a stored item
    fn from_item(item: &Item) -> Result<Self>;
}

fn keyed(key: Key) -> Item {
    Item::new(key.0, key.1)
}

impl EntityCodec for Fund {
    fn key(&self) -> Key {
        keys::fund_key(&self.fund_id)
    }

    fn to_item(&self) -> Item {
        keyed(self.key())
            .with("fund_id", self.fund_id.as_str())
            .with("name", self.name.as_str())
            .with("type", self.fund_type.as_str())
            .with("min_amount", self.min_amount)
            .with("max_amount", self.max_amount)
            .with("risk_level", self.risk_level.as_str())
            .with("description", self.description.clone())
            .with("created_at", self.created_at)
    }

    fn from_item(item: &Item) -> Result<Self> {
        Ok(Fund {
            fund_id: item.require_str("fund_id")?.to_string(),
            name: item.require_str("name")?.to_string(),
            fund_type: item.require_parsed("type")?,
            min_amount: item.require_decimal("min_amount")?,
            max_amount: item.require_decimal("max_amount")?,
            risk_level: item.require_parsed("risk_level")?,
            description: item.optional_str("description")?.map(str::to_string),
            created_at: item.timestamp_or_now("created_at")?,
        })
    }
}

impl EntityCodec for Client {
    fn key(&self) -> Key {
        keys::client_key(&self.client_id)
    }

    fn to_item(&self) -> Item {
        keyed(self.key())
            .with("client_id", self.client_id.as_str())
            .with("nombre", self.name.as_str())
            .with("apellidos", self.surname.as_str())
            .with("ciudad", self.city.as_str())
            .with("email", self.email.clone())
            .with("phone", self.phone.clone())
            .with("created_at", self.created_at)
    }

    fn from_item(item: &Item) -> Result<Self> {
        Ok(Client {
            client_id: item.require_str("client_id")?.to_string(),
            name: item.require_str("nombre")?.to_string(),
            surname: item.require_str("apellidos")?.to_string(),
            city: item.require_str("ciudad")?.to_string(),
            email: item.optional_str("email")?.map(str::to_string),
            phone: item.optional_str("phone")?.map(str::to_string),
            created_at: item.timestamp_or_now("created_at")?,
        })
    }
}

impl EntityCodec for ClientBalance {
    fn key(&self) -> Key {
        keys::balance_key(&self.client_id)
    }

    fn to_item(&self) -> Item {
        keyed(self.key())
            .with("client_id", self.client_id.as_str())
            .with("balance", self.balance)
            .with("updated_at", self.updated_at)
            .with("version", self.version)
    }

    fn from_item(item: &Item) -> Result<Self> {
        // Balances written without a version decode as version 0
        let version = match item.get("version") {
            None | Some(AttributeValue::Null) => 0,
            Some(_) => item
                .require_decimal("version")?
                .to_u64()
                .ok_or_else(|| {
                    Error::MalformedItem(format!("{}/{} has an invalid version", item.pk, item.sk))
                })?,
        };

        Ok(ClientBalance {
            client_id: item.require_str("client_id")?.to_string(),
            balance: item.require_decimal("balance")?,
            updated_at: item.timestamp_or_now("updated_at")?,
            version: Some(version),
        })
    }
}

impl EntityCodec for Transaction {
    fn key(&self) -> Key {
        keys::transaction_key(&self.client_id, &self.transaction_id)
    }

    fn to_item(&self) -> Item {
        keyed(self.key())
            .with("transaction_id", self.transaction_id.as_str())
            .with("client_id", self.client_id.as_str())
            .with("fund_id", self.fund_id.as_str())
            .with("amount", self.amount)
            .with("transaction_type", self.transaction_type.as_str())
            .with("status", self.status.as_str())
            .with("created_at", self.created_at)
    }

    fn from_item(item: &Item) -> Result<Self> {
        Ok(Transaction {
            transaction_id: item.require_str("transaction_id")?.to_string(),
            client_id: item.require_str("client_id")?.to_string(),
            fund_id: item.require_str("fund_id")?.to_string(),
            amount: item.require_decimal("amount")?,
            transaction_type: item.require_parsed("transaction_type")?,
            status: item
                .optional_str("status")?
                .unwrap_or(crate::model::transaction::STATUS_COMPLETED)
                .to_string(),
            created_at: item.timestamp_or_now("created_at")?,
        })
    }
}

impl EntityCodec for ClientFundSubscription {
    fn key(&self) -> Key {
        keys::subscription_key(&self.client_id, &self.fund_id)
    }

    fn to_item(&self) -> Item {
        keyed(self.key())
            .with("client_id", self.client_id.as_str())
            .with("fund_id", self.fund_id.as_str())
            .with("amount", self.amount)
            .with("subscription_date", self.subscription_date)
    }

    fn from_item(item: &Item) -> Result<Self> {
        Ok(ClientFundSubscription {
            client_id: item.require_str("client_id")?.to_string(),
            fund_id: item.require_str("fund_id")?.to_string(),
            amount: item.require_decimal("amount")?,
            subscription_date: item.require_timestamp("subscription_date")?,
        })
    }
}
