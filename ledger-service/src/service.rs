//! Ledger service implementation
//!
//! Each mutation is a sequence of independent store writes in a fixed
//! order: there is no transaction spanning the balance, the subscription
//! and the log entry. Lost updates on the balance are prevented with
//! versioned writes; a write that loses the race re-reads and retries.

use std::sync::Arc;

use common::decimal::precision::MAX_AMOUNT;
use common::decimal::{dec, Amount};
use common::error::{Error, ErrorExt, FailureContext, Result};
use common::model::{
    Client, ClientBalance, ClientFundSubscription, ExistingSubscription, Fund, FundInfo,
    Transaction,
};
use common::store::{InMemoryKeyValueStore, KeyValueStore, PostgresKeyValueStore};
use tracing::{debug, error, info, warn};

use crate::catalog::FundCatalog;
use crate::config::LedgerServiceConfig;
use crate::events::{EventPublisher, LedgerEvent};
use crate::models::{
    BalanceAudit, BalanceOverview, CancellationReceipt, ClientCreation, DepositReceipt,
    InitializationReport, NewClient, SubscribedFund, SubscriptionReceipt,
};
use crate::repository::Repositories;

/// Balance every new client starts with
pub const INITIAL_BALANCE: Amount = dec!(500000);

/// Default number of attempts for a versioned balance write
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 5;

const MISSING_FUND_NAME: &str = "Fund not found";

/// Store backend selection
pub enum RepositoryType {
    /// In-memory store
    InMemory,
    /// PostgreSQL store; `None` reads `DATABASE_URL`
    Postgres(Option<String>),
}

/// Client accounts, fund subscriptions and their ledger
pub struct LedgerService {
    repos: Repositories,
    catalog: FundCatalog,
    events: EventPublisher,
    max_write_attempts: u32,
}

impl LedgerService {
    /// Service over a fresh in-memory store with the embedded catalog
    pub fn new() -> Result<Self> {
        Ok(Self::from_parts(
            Repositories::in_memory(),
            FundCatalog::embedded()?,
            EventPublisher::disabled(),
        ))
    }

    /// Assemble a service from its collaborators
    pub fn from_parts(repos: Repositories, catalog: FundCatalog, events: EventPublisher) -> Self {
        Self {
            repos,
            catalog,
            events,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// Create a service with a specific store backend
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let config = LedgerServiceConfig::from_env();
        let store: Arc<dyn KeyValueStore> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryKeyValueStore::new()),
            RepositoryType::Postgres(database_url) => {
                let url = database_url.unwrap_or_else(|| config.database_url.clone());
                Arc::new(
                    PostgresKeyValueStore::connect(&url, config.db_pool_size, &config.table_name)
                        .await?,
                )
            }
        };

        let catalog = FundCatalog::load(config.fund_catalog_path.as_deref())?;
        Ok(Self::from_parts(Repositories::from_store(store), catalog, EventPublisher::disabled())
            .with_max_write_attempts(config.max_write_attempts))
    }

    /// Create a PostgreSQL-backed service from a configuration
    pub async fn with_config(config: &LedgerServiceConfig) -> Result<Self> {
        let store = PostgresKeyValueStore::connect(
            &config.database_url,
            config.db_pool_size,
            &config.table_name,
        )
        .await?;
        let catalog = FundCatalog::load(config.fund_catalog_path.as_deref())?;

        Ok(Self::from_parts(
            Repositories::from_store(Arc::new(store)),
            catalog,
            EventPublisher::disabled(),
        )
        .with_max_write_attempts(config.max_write_attempts))
    }

    /// Publish committed mutations on `events`
    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn with_max_write_attempts(mut self, attempts: u32) -> Self {
        self.max_write_attempts = attempts.max(1);
        self
    }

    /// Repositories the service writes through
    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Create the table if needed and upsert every catalog fund
    pub async fn initialize(&self) -> Result<InitializationReport> {
        info!("Initializing ledger store");

        let table_created = self
            .repos
            .store
            .create_table_if_not_exists()
            .await
            .with_context(|| "Failed to create ledger table")?;

        for definition in self.catalog.definitions() {
            let fund = definition.to_fund();
            self.repos
                .funds
                .save(&fund)
                .await
                .with_context(|| format!("Failed to load fund {}", fund.fund_id))?;
            debug!("Loaded fund {} ({})", fund.fund_id, fund.name);
        }

        info!("Loaded {} funds", self.catalog.len());
        Ok(InitializationReport {
            table_created,
            funds_loaded: self.catalog.len(),
        })
    }

    /// Get a fund by ID
    pub async fn get_fund(&self, fund_id: &str) -> Result<Option<Fund>> {
        self.repos.funds.get(fund_id).await
    }

    /// Every available fund
    pub async fn list_funds(&self) -> Result<Vec<Fund>> {
        let mut funds = self.repos.funds.list().await?;
        funds.sort_by(|a, b| a.fund_id.cmp(&b.fund_id));
        Ok(funds)
    }

    /// Get a client by ID
    pub async fn get_client(&self, client_id: &str) -> Result<Option<Client>> {
        self.repos.clients.get(client_id).await
    }

    /// Every client
    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        self.repos.clients.list().await
    }

    /// A client's balance, created at 0 on first access
    pub async fn get_balance(&self, client_id: &str) -> Result<ClientBalance> {
        if let Some(balance) = self.repos.balances.get(client_id).await? {
            return Ok(balance);
        }

        match self.repos.balances.save(&ClientBalance::new(client_id, Amount::ZERO)).await {
            Ok(balance) => {
                debug!("Created empty balance for client {}", client_id);
                Ok(balance)
            }
            // Someone else created it first
            Err(Error::ConditionFailed(_)) => self
                .repos
                .balances
                .get(client_id)
                .await?
                .ok_or_else(|| Error::Internal(format!("Balance of client {} vanished", client_id))),
            Err(e) => Err(e),
        }
    }

    /// A client's balance with the funds it is subscribed to
    pub async fn get_balance_overview(&self, client_id: &str) -> Result<BalanceOverview> {
        let balance = self.get_balance(client_id).await?;
        let subscriptions = self.repos.subscriptions.list(client_id).await?;

        let mut subscribed_funds = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            let fund = self.repos.funds.get(&subscription.fund_id).await?;
            subscribed_funds.push(SubscribedFund {
                fund_name: fund
                    .as_ref()
                    .map_or_else(|| MISSING_FUND_NAME.to_string(), |f| f.name.clone()),
                fund_type: fund
                    .as_ref()
                    .map_or_else(String::new, |f| f.fund_type.to_string()),
                fund_id: subscription.fund_id,
                subscribed_amount: subscription.amount,
                subscription_date: subscription.subscription_date,
            });
        }

        Ok(BalanceOverview {
            client_id: balance.client_id,
            available_balance: balance.balance,
            total_subscribed_funds: subscribed_funds.len(),
            subscribed_funds,
            updated_at: balance.updated_at,
        })
    }

    /// A client's active subscriptions
    pub async fn list_subscriptions(&self, client_id: &str) -> Result<Vec<ClientFundSubscription>> {
        self.repos.subscriptions.list(client_id).await
    }

    /// A client's transaction log, oldest first
    pub async fn list_transactions(&self, client_id: &str) -> Result<Vec<Transaction>> {
        self.repos.transactions.list(client_id).await
    }

    /// Compare the stored balance with the one implied by the transaction log
    pub async fn audit_balance(&self, client_id: &str) -> Result<BalanceAudit> {
        let transactions = self.repos.transactions.list(client_id).await?;
        let stored_balance = self
            .repos
            .balances
            .get(client_id)
            .await?
            .map_or(Amount::ZERO, |b| b.balance);

        let ledger_balance: Amount = transactions.iter().map(Transaction::balance_effect).sum();
        let consistent = ledger_balance == stored_balance;
        if !consistent {
            warn!(
                "Balance of client {} is {} but its ledger sums to {}",
                client_id, stored_balance, ledger_balance
            );
        }

        Ok(BalanceAudit {
            client_id: client_id.to_string(),
            stored_balance,
            ledger_balance,
            transaction_count: transactions.len(),
            consistent,
        })
    }

    /// Open a client account with the initial balance
    pub async fn create_client(&self, new_client: NewClient) -> Result<ClientCreation> {
        let client_id = new_client.client_id.clone();
        info!("Creating client {}", client_id);

        if self.repos.clients.get(&client_id).await?.is_some() {
            return Err(Error::already_exists(format!("Client {} already exists", client_id)));
        }

        let client = Client::new(
            new_client.client_id,
            new_client.name,
            new_client.surname,
            new_client.city,
            new_client.email,
            new_client.phone,
        );

        match self.repos.clients.create(&client).await {
            Ok(()) => {}
            Err(Error::ConditionFailed(_)) => {
                return Err(Error::already_exists(format!("Client {} already exists", client_id)));
            }
            Err(e) => return Err(e),
        }

        let balance = self
            .update_balance(&client_id, |balance| {
                balance.reset(INITIAL_BALANCE);
                Ok(())
            })
            .await
            .with_context(|| format!("Failed to set initial balance of client {}", client_id))?;

        let transaction = Transaction::initial_balance(&client_id, INITIAL_BALANCE);
        self.repos.transactions.append(&transaction).await?;

        info!("Client {} created with balance {}", client_id, balance.balance);
        self.events.publish(LedgerEvent::ClientCreated {
            client_id: client_id.clone(),
            name: client.name.clone(),
            initial_balance: INITIAL_BALANCE,
        });

        Ok(ClientCreation {
            client,
            balance,
            transaction,
        })
    }

    /// Credit cash to a client
    pub async fn deposit(&self, client_id: &str, amount: Amount) -> Result<DepositReceipt> {
        info!("Depositing {} to client {}", amount, client_id);

        self.require_client(client_id).await?;

        if amount <= Amount::ZERO {
            return Err(Error::InvalidAmount("Amount must be greater than 0".to_string()));
        }
        if amount > MAX_AMOUNT {
            return Err(Error::InvalidAmount(format!("Amount must not exceed {}", MAX_AMOUNT)));
        }

        let balance = self
            .update_balance(client_id, |balance| {
                balance
                    .credit(amount)
                    .map_err(|e| Error::InvalidAmount(e.message()))
            })
            .await?;

        let transaction = Transaction::deposit(client_id, amount);
        self.repos.transactions.append(&transaction).await?;

        self.events.publish(LedgerEvent::Deposited {
            client_id: client_id.to_string(),
            amount,
            new_balance: balance.balance,
        });

        Ok(DepositReceipt {
            client_id: client_id.to_string(),
            amount,
            new_balance: balance.balance,
            transaction,
        })
    }

    /// Subscribe a client to a fund for the fund's minimum amount
    pub async fn subscribe(&self, client_id: &str, fund_id: &str) -> Result<SubscriptionReceipt> {
        info!("Subscribing client {} to fund {}", client_id, fund_id);

        self.require_client(client_id).await?;
        let fund = self
            .repos
            .funds
            .get(fund_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Fund {} does not exist", fund_id)))?;
        let amount = fund.subscription_amount();

        if let Some(existing) = self.repos.subscriptions.get(client_id, fund_id).await? {
            return Err(already_subscribed(&fund, &existing));
        }

        let current = self
            .repos
            .balances
            .get(client_id)
            .await?
            .map_or(Amount::ZERO, |b| b.balance);
        if current < amount {
            return Err(insufficient_funds(&fund, current));
        }

        let subscription = ClientFundSubscription::new(client_id, fund_id, amount);
        match self.repos.subscriptions.create(&subscription).await {
            Ok(()) => {}
            Err(Error::ConditionFailed(_)) => {
                return Err(match self.repos.subscriptions.get(client_id, fund_id).await? {
                    Some(existing) => already_subscribed(&fund, &existing),
                    None => Error::already_exists(format!(
                        "Client {} is already subscribed to fund {}",
                        client_id, fund.name
                    )),
                });
            }
            Err(e) => return Err(e),
        }

        let debit = self
            .update_balance(client_id, |balance| {
                if !balance.covers(amount) {
                    return Err(insufficient_funds(&fund, balance.balance));
                }
                balance
                    .debit(amount)
                    .map_err(|e| Error::Internal(format!("Debit failed after balance check: {}", e)))
            })
            .await;

        let balance = match debit {
            Ok(balance) => balance,
            Err(e @ (Error::InsufficientFunds { .. } | Error::ConcurrentModification(_))) => {
                // Nothing was debited, withdraw the subscription again
                warn!(
                    "Rolling back subscription of client {} to fund {}: {}",
                    client_id, fund_id, e
                );
                if let Err(rollback) = self.repos.subscriptions.delete(client_id, fund_id).await {
                    error!(
                        "Failed to roll back subscription of client {} to fund {}: {}",
                        client_id, fund_id, rollback
                    );
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let transaction = Transaction::subscription(client_id, fund_id, amount);
        self.repos.transactions.append(&transaction).await?;

        info!(
            "Client {} subscribed to fund {} for {}, balance now {}",
            client_id, fund_id, amount, balance.balance
        );
        self.events.publish(LedgerEvent::Subscribed {
            client_id: client_id.to_string(),
            fund_id: fund_id.to_string(),
            fund_name: fund.name.clone(),
            amount,
            new_balance: balance.balance,
        });

        Ok(SubscriptionReceipt {
            subscription,
            transaction,
            new_balance: balance.balance,
        })
    }

    /// Cancel a subscription and refund its full amount
    pub async fn cancel(&self, client_id: &str, fund_id: &str) -> Result<CancellationReceipt> {
        info!("Cancelling subscription of client {} to fund {}", client_id, fund_id);

        let fund = self
            .repos
            .funds
            .get(fund_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Fund {} does not exist", fund_id)))?;

        let no_subscription =
            || Error::NotFound(format!("No active subscription to fund {}", fund.name));

        if self.repos.subscriptions.get(client_id, fund_id).await?.is_none() {
            return Err(no_subscription());
        }

        // Only the caller that actually removed the item refunds it
        let removed = self
            .repos
            .subscriptions
            .delete(client_id, fund_id)
            .await?
            .ok_or_else(no_subscription)?;
        let refund = removed.amount;

        let balance = self
            .update_balance(client_id, |balance| balance.credit(refund))
            .await
            .with_context(|| {
                format!("Subscription of client {} to fund {} removed but not refunded", client_id, fund_id)
            })?;

        let transaction = Transaction::cancellation(client_id, fund_id, refund);
        self.repos.transactions.append(&transaction).await?;

        info!(
            "Client {} cancelled fund {}, refunded {}, balance now {}",
            client_id, fund_id, refund, balance.balance
        );
        self.events.publish(LedgerEvent::Cancelled {
            client_id: client_id.to_string(),
            fund_id: fund_id.to_string(),
            fund_name: fund.name.clone(),
            refunded: refund,
            new_balance: balance.balance,
        });

        Ok(CancellationReceipt {
            client_id: client_id.to_string(),
            fund_id: fund_id.to_string(),
            refunded_amount: refund,
            new_balance: balance.balance,
            transaction,
        })
    }

    async fn require_client(&self, client_id: &str) -> Result<Client> {
        self.repos
            .clients
            .get(client_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Client {} does not exist", client_id)))
    }

    /// Read-modify-write of a balance with a versioned write, retried on conflict.
    ///
    /// `apply` sees a fresh copy on every attempt; an absent balance starts at 0.
    async fn update_balance<F>(&self, client_id: &str, mut apply: F) -> Result<ClientBalance>
    where
        F: FnMut(&mut ClientBalance) -> Result<()> + Send,
    {
        for attempt in 1..=self.max_write_attempts {
            let mut balance = self
                .repos
                .balances
                .get(client_id)
                .await?
                .unwrap_or_else(|| ClientBalance::new(client_id, Amount::ZERO));

            apply(&mut balance)?;

            match self.repos.balances.save(&balance).await {
                Ok(saved) => return Ok(saved),
                Err(Error::ConditionFailed(_)) => {
                    warn!(
                        "Balance of client {} changed concurrently (attempt {}/{})",
                        client_id, attempt, self.max_write_attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::ConcurrentModification(format!(
            "Balance of client {} kept changing after {} attempts",
            client_id, self.max_write_attempts
        )))
    }
}

fn already_subscribed(fund: &Fund, existing: &ClientFundSubscription) -> Error {
    Error::AlreadyExists {
        message: format!("Client is already subscribed to fund {}", fund.name),
        context: Some(Box::new(FailureContext {
            fund_info: Some(FundInfo::from(fund)),
            existing_subscription: Some(ExistingSubscription::from(existing)),
            ..FailureContext::default()
        })),
    }
}

fn insufficient_funds(fund: &Fund, current: Amount) -> Error {
    let required = fund.subscription_amount();
    Error::InsufficientFunds {
        message: format!("Insufficient balance to subscribe to fund {}", fund.name),
        context: Box::new(FailureContext {
            fund_info: Some(FundInfo::from(fund)),
            required_amount: Some(required),
            current_balance: Some(current),
            missing_amount: Some(required - current),
            ..FailureContext::default()
        }),
    }
}
