//! Single-table key-value store
//!
//! Every entity lives in one table keyed by `(pk, sk)`. This module defines
//! the store contract used by the repositories and provides two backends:
//! an in-memory one for tests and local runs, and a PostgreSQL one for
//! persistent deployments.
//!
//! Every operation fails with [`Error::StoreUnavailable`] on a transport
//! problem and never retries.
//!
//! [`Error::StoreUnavailable`]: crate::error::Error::StoreUnavailable

mod item;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;

pub use item::{AttributeValue, Attributes, Item, PARTITION_KEY, SORT_KEY};
pub use memory::InMemoryKeyValueStore;
pub use postgres::PostgresKeyValueStore;

/// Precondition for [`KeyValueStore::put_conditional`]
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// No item is stored under the key
    NotExists,
    /// An item is stored under the key and `name` holds exactly `value`
    AttributeEquals {
        name: String,
        value: AttributeValue,
    },
    /// An item is stored under the key and `name` is absent or null
    AttributeMissing { name: String },
}

impl Condition {
    pub fn attribute_equals(name: &str, value: impl Into<AttributeValue>) -> Self {
        Condition::AttributeEquals {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn attribute_missing(name: &str) -> Self {
        Condition::AttributeMissing {
            name: name.to_string(),
        }
    }

    /// Evaluate against the item currently stored under the key
    pub fn holds_for(&self, current: Option<&Item>) -> bool {
        match (self, current) {
            (Condition::NotExists, None) => true,
            (Condition::NotExists, Some(_)) => false,
            (Condition::AttributeEquals { .. }, None) => false,
            (Condition::AttributeEquals { name, value }, Some(item)) => item.get(name) == Some(value),
            (Condition::AttributeMissing { .. }, None) => false,
            (Condition::AttributeMissing { name }, Some(item)) => {
                item.get(name).map_or(true, AttributeValue::is_null)
            }
        }
    }
}

/// Key-value store contract
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Create the backing table; returns false when it already existed
    async fn create_table_if_not_exists(&self) -> Result<bool>;

    /// Insert or overwrite an item
    async fn put(&self, item: Item) -> Result<()>;

    /// Insert or overwrite only if `condition` holds, else `ConditionFailed`
    async fn put_conditional(&self, item: Item, condition: Condition) -> Result<()>;

    /// Point lookup; absent is not an error
    async fn get(&self, pk: &str, sk: &str) -> Result<Option<Item>>;

    /// All items under `pk`, optionally restricted to a sort-key prefix, ordered by sort key
    async fn query(&self, pk: &str, sk_prefix: Option<&str>) -> Result<Vec<Item>>;

    /// Every item in the table
    async fn scan(&self) -> Result<Vec<Item>>;

    /// Remove an item, returning what was removed
    async fn delete(&self, pk: &str, sk: &str) -> Result<Option<Item>>;

    /// Merge attribute changes into an item, creating it when absent
    async fn update(&self, pk: &str, sk: &str, changes: Attributes) -> Result<Item>;
}
