//! In-memory key-value store

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::{Attributes, Condition, Item, KeyValueStore};
use crate::error::{Error, Result};

/// In-memory store for tests and local runs
pub struct InMemoryKeyValueStore {
    /// Items by (pk, sk)
    pub items: DashMap<(String, String), Item>,
    /// Whether the table was created
    table_created: AtomicBool,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            table_created: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn sorted(mut items: Vec<Item>) -> Vec<Item> {
        items.sort_by(|a, b| (&a.pk, &a.sk).cmp(&(&b.pk, &b.sk)));
        items
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn create_table_if_not_exists(&self) -> Result<bool> {
        let existed = self.table_created.swap(true, Ordering::SeqCst);
        Ok(!existed)
    }

    async fn put(&self, item: Item) -> Result<()> {
        debug!("put {}/{}", item.pk, item.sk);
        self.items.insert((item.pk.clone(), item.sk.clone()), item);
        Ok(())
    }

    async fn put_conditional(&self, item: Item, condition: Condition) -> Result<()> {
        debug!("conditional put {}/{} ({:?})", item.pk, item.sk, condition);
        let key = (item.pk.clone(), item.sk.clone());

        // The entry guard holds the shard lock, so check and write are one step
        match self.items.entry(key) {
            Entry::Occupied(mut entry) => {
                if !condition.holds_for(Some(entry.get())) {
                    return Err(Error::ConditionFailed(format!("{}/{}", item.pk, item.sk)));
                }
                entry.insert(item);
            }
            Entry::Vacant(entry) => {
                if !condition.holds_for(None) {
                    return Err(Error::ConditionFailed(format!("{}/{}", item.pk, item.sk)));
                }
                entry.insert(item);
            }
        }

        Ok(())
    }

    async fn get(&self, pk: &str, sk: &str) -> Result<Option<Item>> {
        Ok(self
            .items
            .get(&(pk.to_string(), sk.to_string()))
            .map(|item| item.clone()))
    }

    async fn query(&self, pk: &str, sk_prefix: Option<&str>) -> Result<Vec<Item>> {
        let prefix = sk_prefix.unwrap_or("");
        let items = self
            .items
            .iter()
            .filter(|entry| {
                let (item_pk, item_sk) = entry.key();
                item_pk == pk && item_sk.starts_with(prefix)
            })
            .map(|entry| entry.value().clone())
            .collect();

        Ok(Self::sorted(items))
    }

    async fn scan(&self) -> Result<Vec<Item>> {
        let items = self.items.iter().map(|entry| entry.value().clone()).collect();
        Ok(Self::sorted(items))
    }

    async fn delete(&self, pk: &str, sk: &str) -> Result<Option<Item>> {
        debug!("delete {}/{}", pk, sk);
        Ok(self
            .items
            .remove(&(pk.to_string(), sk.to_string()))
            .map(|(_, item)| item))
    }

    async fn update(&self, pk: &str, sk: &str, changes: Attributes) -> Result<Item> {
        debug!("update {}/{}", pk, sk);
        let mut entry = self
            .items
            .entry((pk.to_string(), sk.to_string()))
            .or_insert_with(|| Item::new(pk, sk));
        entry.merge(changes);
        Ok(entry.value().clone())
    }
}
