//! PostgreSQL-backed key-value store
//!
//! The whole table is one relation `(pk TEXT, sk TEXT, attributes JSONB)`
//! with a composite primary key. Attributes are stored as the tagged JSON
//! encoding of [`AttributeValue`](super::AttributeValue), so decimals keep their exact text.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use super::{Attributes, Condition, Item, KeyValueStore, PARTITION_KEY, SORT_KEY};
use crate::error::{Error, Result};

/// PostgreSQL store
pub struct PostgresKeyValueStore {
    /// Database connection pool
    pool: PgPool,
    /// Table name, validated as a plain identifier
    table: String,
}

impl PostgresKeyValueStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if table.is_empty()
            || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            || table.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(Error::ConfigurationError(format!("Invalid table name: {}", table)));
        }

        Ok(Self { pool, table })
    }

    /// Connect to the database and wrap the resulting pool
    pub async fn connect(database_url: &str, max_connections: u32, table: &str) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL database");

        Self::new(pool, table)
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    fn row_to_item(row: PgRow) -> Result<Item> {
        let pk: String = row.try_get(PARTITION_KEY)?;
        let sk: String = row.try_get(SORT_KEY)?;
        let Json(attributes): Json<Attributes> = row.try_get("attributes").map_err(|e| {
            Error::MalformedItem(format!("{}/{} has unreadable attributes: {}", pk, sk, e))
        })?;

        Ok(Item { pk, sk, attributes })
    }
}

#[async_trait]
impl KeyValueStore for PostgresKeyValueStore {
    async fn create_table_if_not_exists(&self) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(&self.table)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            info!("Table {} already exists", self.table);
            return Ok(false);
        }

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                pk TEXT NOT NULL,
                sk TEXT NOT NULL,
                attributes JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                PRIMARY KEY (pk, sk)
            )",
            self.table
        ))
        .execute(&self.pool)
        .await?;

        info!("Table {} created", self.table);
        Ok(true)
    }

    async fn put(&self, item: Item) -> Result<()> {
        debug!("Putting item {}/{}", item.pk, item.sk);

        sqlx::query(&format!(
            "INSERT INTO {} (pk, sk, attributes) VALUES ($1, $2, $3)
             ON CONFLICT (pk, sk) DO UPDATE SET attributes = EXCLUDED.attributes",
            self.table
        ))
        .bind(&item.pk)
        .bind(&item.sk)
        .bind(Json(&item.attributes))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn put_conditional(&self, item: Item, condition: Condition) -> Result<()> {
        debug!("Conditional put {}/{} ({:?})", item.pk, item.sk, condition);

        let result = match &condition {
            Condition::NotExists => {
                sqlx::query(&format!(
                    "INSERT INTO {} (pk, sk, attributes) VALUES ($1, $2, $3)
                     ON CONFLICT (pk, sk) DO NOTHING",
                    self.table
                ))
                .bind(&item.pk)
                .bind(&item.sk)
                .bind(Json(&item.attributes))
                .execute(&self.pool)
                .await?
            }
            Condition::AttributeEquals { name, value } => {
                sqlx::query(&format!(
                    "UPDATE {} SET attributes = $3
                     WHERE pk = $1 AND sk = $2 AND attributes -> $4 = $5",
                    self.table
                ))
                .bind(&item.pk)
                .bind(&item.sk)
                .bind(Json(&item.attributes))
                .bind(name)
                .bind(Json(value))
                .execute(&self.pool)
                .await?
            }
            Condition::AttributeMissing { name } => {
                sqlx::query(&format!(
                    "UPDATE {} SET attributes = $3
                     WHERE pk = $1 AND sk = $2
                       AND (NOT jsonb_exists(attributes, $4) OR attributes -> $4 = '\"NULL\"'::jsonb)",
                    self.table
                ))
                .bind(&item.pk)
                .bind(&item.sk)
                .bind(Json(&item.attributes))
                .bind(name)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(Error::ConditionFailed(format!("{}/{}", item.pk, item.sk)));
        }

        Ok(())
    }

    async fn get(&self, pk: &str, sk: &str) -> Result<Option<Item>> {
        debug!("Getting item {}/{}", pk, sk);

        let row = sqlx::query(&format!(
            "SELECT pk, sk, attributes FROM {} WHERE pk = $1 AND sk = $2",
            self.table
        ))
        .bind(pk)
        .bind(sk)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn query(&self, pk: &str, sk_prefix: Option<&str>) -> Result<Vec<Item>> {
        debug!("Querying {} with prefix {:?}", pk, sk_prefix);

        // left() instead of LIKE so '%' and '_' in keys stay literal
        let rows = sqlx::query(&format!(
            "SELECT pk, sk, attributes FROM {}
             WHERE pk = $1 AND left(sk, char_length($2)) = $2
             ORDER BY sk",
            self.table
        ))
        .bind(pk)
        .bind(sk_prefix.unwrap_or(""))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn scan(&self) -> Result<Vec<Item>> {
        debug!("Scanning table {}", self.table);

        let rows = sqlx::query(&format!(
            "SELECT pk, sk, attributes FROM {} ORDER BY pk, sk",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn delete(&self, pk: &str, sk: &str) -> Result<Option<Item>> {
        debug!("Deleting item {}/{}", pk, sk);

        let row = sqlx::query(&format!(
            "DELETE FROM {} WHERE pk = $1 AND sk = $2 RETURNING pk, sk, attributes",
            self.table
        ))
        .bind(pk)
        .bind(sk)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn update(&self, pk: &str, sk: &str, changes: Attributes) -> Result<Item> {
        debug!("Updating item {}/{} ({} attributes)", pk, sk, changes.len());

        let row = sqlx::query(&format!(
            "INSERT INTO {table} (pk, sk, attributes) VALUES ($1, $2, $3)
             ON CONFLICT (pk, sk) DO UPDATE SET attributes = {table}.attributes || EXCLUDED.attributes
             RETURNING pk, sk, attributes",
            table = self.table
        ))
        .bind(pk)
        .bind(sk)
        .bind(Json(&changes))
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_item(row)
    }
}
