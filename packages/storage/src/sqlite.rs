// ABOUTME: SQLite implementation of TokenStore using SQLx
// ABOUTME: Unique-constraint conflicts, compare-and-delete consumption, explicit expiry purge

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tether_core::{redact_token, NewToken, TokenRecord};
use tether_tokens::{StoreError, StoreResult, TokenStore};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::StorageResult;

const TOKEN_COLUMNS: &str = "id, value, name, owner_type, owner_id, created_at, expires_at";

/// SQLite implementation of TokenStore
#[derive(Clone)]
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    /// Wrap an existing pool; call [`Self::migrate`] before first use
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database described by `config` and run migrations
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let database_url = format!("sqlite:{}", config.database_path.display());

        if !sqlx::Sqlite::database_exists(&database_url).await? {
            debug!("Creating database at: {}", database_url);
            sqlx::Sqlite::create_database(&database_url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.busy_timeout_seconds))
            .connect(&database_url)
            .await?;

        if config.enable_wal {
            sqlx::query("PRAGMA journal_mode = WAL")
                .execute(&pool)
                .await?;
        }

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;

        info!("Token store ready at {}", config.database_path.display());
        Ok(store)
    }

    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Helper to convert database row to TokenRecord
    fn row_to_token(row: &SqliteRow) -> StoreResult<TokenRecord> {
        let created_at: String = row.try_get("created_at").map_err(db_error)?;
        let expires_at: Option<String> = row.try_get("expires_at").map_err(db_error)?;

        Ok(TokenRecord {
            id: row.try_get("id").map_err(db_error)?,
            value: row.try_get("value").map_err(db_error)?,
            name: row.try_get("name").map_err(db_error)?,
            owner_type: row.try_get("owner_type").map_err(db_error)?,
            owner_id: row.try_get("owner_id").map_err(db_error)?,
            created_at: parse_timestamp(&created_at)?,
            expires_at: expires_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn insert(&self, token: &NewToken) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO tokens (id, value, name, owner_type, owner_id, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&token.value)
        .bind(&token.name)
        .bind(&token.owner_type)
        .bind(&token.owner_id)
        .bind(format_timestamp(token.created_at))
        .bind(token.expires_at.map(format_timestamp))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(
                    "Stored token {} for {}#{}",
                    id, token.owner_type, token.owner_id
                );
                Ok(id)
            }
            Err(sqlx::Error::Database(db_err)) => {
                // SQLITE_CONSTRAINT_UNIQUE / SQLITE_CONSTRAINT_PRIMARYKEY
                if let Some(code) = db_err.code() {
                    if code == "2067" || code == "1555" {
                        debug!(
                            "Token value {} already exists",
                            redact_token(&token.value)
                        );
                        return Err(StoreError::Conflict);
                    }
                }
                error!("Failed to insert token: {}", db_err);
                Err(StoreError::Database(db_err.to_string()))
            }
            Err(e) => {
                error!("Failed to insert token: {}", e);
                Err(db_error(e))
            }
        }
    }

    async fn find_by_value(&self, value: &str) -> StoreResult<Option<TokenRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tokens WHERE value = ?",
            TOKEN_COLUMNS
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_by_owner(
        &self,
        owner_type: &str,
        owner_id: &str,
    ) -> StoreResult<Vec<TokenRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tokens WHERE owner_type = ? AND owner_id = ? ORDER BY created_at DESC",
            TOKEN_COLUMNS
        ))
        .bind(owner_type)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(Self::row_to_token).collect()
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_by_id_and_value(
        &self,
        id: &str,
        value: &str,
    ) -> StoreResult<Option<TokenRecord>> {
        // Single statement, so concurrent callers cannot both receive the row
        let row = sqlx::query(&format!(
            "DELETE FROM tokens WHERE id = ? AND value = ? RETURNING {}",
            TOKEN_COLUMNS
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result =
            sqlx::query("DELETE FROM tokens WHERE expires_at IS NOT NULL AND expires_at < ?")
                .bind(format_timestamp(now))
                .execute(&self.pool)
                .await
                .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}

/// Fixed-width UTC form; lexical order equals chronological order
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidRow(format!("bad timestamp {:?}: {}", raw, e)))
}

fn db_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolClosed => StoreError::Cancelled,
        other => StoreError::Database(other.to_string()),
    }
}
