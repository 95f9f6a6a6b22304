//! Repositories for ledger data
//!
//! One trait per entity, each implemented over a shared [`KeyValueStore`].
//! The repositories only translate between entities and items; the business
//! rules and the retry policy for conflicting writes live in the service.

use std::sync::Arc;

use async_trait::async_trait;
use common::codec::{keys, EntityCodec};
use common::error::Result;
use common::model::{Client, ClientBalance, ClientFundSubscription, Fund, Transaction};
use common::store::{Condition, InMemoryKeyValueStore, Item, KeyValueStore};
use tracing::debug;

fn decode_all<T: EntityCodec>(items: &[Item]) -> Result<Vec<T>> {
    items.iter().map(T::from_item).collect()
}

/// Fund data storage
#[async_trait]
pub trait FundRepository: Send + Sync {
    /// Insert or overwrite a fund
    async fn save(&self, fund: &Fund) -> Result<()>;

    /// Get a fund by ID
    async fn get(&self, fund_id: &str) -> Result<Option<Fund>>;

    /// Every stored fund
    async fn list(&self) -> Result<Vec<Fund>>;
}

/// Client profile storage
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Insert a client; `ConditionFailed` when the ID is taken
    async fn create(&self, client: &Client) -> Result<()>;

    /// Get a client by ID
    async fn get(&self, client_id: &str) -> Result<Option<Client>>;

    /// Every stored client profile
    async fn list(&self) -> Result<Vec<Client>>;

    /// Remove a client profile, returning it
    async fn delete(&self, client_id: &str) -> Result<Option<Client>>;
}

/// Client balance storage with versioned writes
#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Get a client's balance
    async fn get(&self, client_id: &str) -> Result<Option<ClientBalance>>;

    /// Write `balance` if the stored version still matches the one it was
    /// read with, returning the stored copy with its new version.
    ///
    /// A balance that was never stored (`version == None`) is only written
    /// when no balance exists yet. Fails with `ConditionFailed` otherwise.
    async fn save(&self, balance: &ClientBalance) -> Result<ClientBalance>;
}

/// Append-only transaction log
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Append a transaction; its ID must be fresh
    async fn append(&self, transaction: &Transaction) -> Result<()>;

    /// A client's transactions, oldest first; ties on `created_at` are ordered by transaction ID
    async fn list(&self, client_id: &str) -> Result<Vec<Transaction>>;
}

/// Active fund subscriptions
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a subscription; `ConditionFailed` when one already exists
    async fn create(&self, subscription: &ClientFundSubscription) -> Result<()>;

    /// Get a client's subscription to a fund
    async fn get(&self, client_id: &str, fund_id: &str) -> Result<Option<ClientFundSubscription>>;

    /// A client's active subscriptions
    async fn list(&self, client_id: &str) -> Result<Vec<ClientFundSubscription>>;

    /// Remove a subscription; `None` when there was nothing to remove
    async fn delete(&self, client_id: &str, fund_id: &str) -> Result<Option<ClientFundSubscription>>;
}

/// Store-backed fund repository
pub struct StoreFundRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StoreFundRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FundRepository for StoreFundRepository {
    async fn save(&self, fund: &Fund) -> Result<()> {
        self.store.put(fund.to_item()).await
    }

    async fn get(&self, fund_id: &str) -> Result<Option<Fund>> {
        let (pk, sk) = keys::fund_key(fund_id);
        self.store
            .get(&pk, &sk)
            .await?
            .as_ref()
            .map(Fund::from_item)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Fund>> {
        let items: Vec<Item> = self
            .store
            .scan()
            .await?
            .into_iter()
            .filter(|item| keys::is_fund_item(&item.pk, &item.sk))
            .collect();

        debug!("Found {} funds", items.len());
        decode_all(&items)
    }
}

/// Store-backed client repository
pub struct StoreClientRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StoreClientRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ClientRepository for StoreClientRepository {
    async fn create(&self, client: &Client) -> Result<()> {
        self.store
            .put_conditional(client.to_item(), Condition::NotExists)
            .await
    }

    async fn get(&self, client_id: &str) -> Result<Option<Client>> {
        let (pk, sk) = keys::client_key(client_id);
        self.store
            .get(&pk, &sk)
            .await?
            .as_ref()
            .map(Client::from_item)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Client>> {
        let items: Vec<Item> = self
            .store
            .scan()
            .await?
            .into_iter()
            .filter(|item| keys::is_client_profile_item(&item.pk, &item.sk))
            .collect();

        debug!("Found {} clients", items.len());
        decode_all(&items)
    }

    async fn delete(&self, client_id: &str) -> Result<Option<Client>> {
        let (pk, sk) = keys::client_key(client_id);
        self.store
            .delete(&pk, &sk)
            .await?
            .as_ref()
            .map(Client::from_item)
            .transpose()
    }
}

/// Store-backed balance repository
pub struct StoreBalanceRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StoreBalanceRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BalanceRepository for StoreBalanceRepository {
    async fn get(&self, client_id: &str) -> Result<Option<ClientBalance>> {
        let (pk, sk) = keys::balance_key(client_id);
        self.store
            .get(&pk, &sk)
            .await?
            .as_ref()
            .map(ClientBalance::from_item)
            .transpose()
    }

    async fn save(&self, balance: &ClientBalance) -> Result<ClientBalance> {
        let condition = match balance.version {
            None => Condition::NotExists,
            Some(0) => Condition::attribute_missing("version"),
            Some(version) => Condition::attribute_equals("version", version),
        };

        let mut stored = balance.clone();
        stored.version = Some(balance.version.unwrap_or(0) + 1);

        debug!(
            "Saving balance of client {} at version {:?}",
            balance.client_id, stored.version
        );
        self.store.put_conditional(stored.to_item(), condition).await?;

        Ok(stored)
    }
}

/// Store-backed transaction log
pub struct StoreTransactionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StoreTransactionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionRepository for StoreTransactionRepository {
    async fn append(&self, transaction: &Transaction) -> Result<()> {
        self.store
            .put_conditional(transaction.to_item(), Condition::NotExists)
            .await
    }

    async fn list(&self, client_id: &str) -> Result<Vec<Transaction>> {
        let items = self
            .store
            .query(&keys::client_pk(client_id), Some(keys::TRANSACTION_PREFIX))
            .await?;

        // Entries stamped in the same tick fall back to transaction ID order
        let mut transactions: Vec<Transaction> = decode_all(&items)?;
        transactions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.transaction_id.cmp(&b.transaction_id))
        });
        Ok(transactions)
    }
}

/// Store-backed subscription repository
pub struct StoreSubscriptionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StoreSubscriptionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SubscriptionRepository for StoreSubscriptionRepository {
    async fn create(&self, subscription: &ClientFundSubscription) -> Result<()> {
        self.store
            .put_conditional(subscription.to_item(), Condition::NotExists)
            .await
    }

    async fn get(&self, client_id: &str, fund_id: &str) -> Result<Option<ClientFundSubscription>> {
        let (pk, sk) = keys::subscription_key(client_id, fund_id);
        self.store
            .get(&pk, &sk)
            .await?
            .as_ref()
            .map(ClientFundSubscription::from_item)
            .transpose()
    }

    async fn list(&self, client_id: &str) -> Result<Vec<ClientFundSubscription>> {
        let items = self
            .store
            .query(&keys::client_pk(client_id), Some(keys::SUBSCRIPTION_PREFIX))
            .await?;

        decode_all(&items)
    }

    async fn delete(&self, client_id: &str, fund_id: &str) -> Result<Option<ClientFundSubscription>> {
        let (pk, sk) = keys::subscription_key(client_id, fund_id);
        self.store
            .delete(&pk, &sk)
            .await?
            .as_ref()
            .map(ClientFundSubscription::from_item)
            .transpose()
    }
}

/// Every repository the ledger needs, sharing one store
#[derive(Clone)]
pub struct Repositories {
    pub store: Arc<dyn KeyValueStore>,
    pub funds: Arc<dyn FundRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub balances: Arc<dyn BalanceRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
}

impl Repositories {
    /// Store-backed repositories over `store`
    pub fn from_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            funds: Arc::new(StoreFundRepository::new(store.clone())),
            clients: Arc::new(StoreClientRepository::new(store.clone())),
            balances: Arc::new(StoreBalanceRepository::new(store.clone())),
            transactions: Arc::new(StoreTransactionRepository::new(store.clone())),
            subscriptions: Arc::new(StoreSubscriptionRepository::new(store.clone())),
            store,
        }
    }

    /// Repositories over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(InMemoryKeyValueStore::new()))
    }
}
