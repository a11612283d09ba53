// ABOUTME: Persistence boundary for token records
// ABOUTME: TokenStore trait implemented by the in-memory and SQLite adapters

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tether_core::{NewToken, TokenRecord};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Another record already uses this token value
    #[error("Token value conflicts with an existing record")]
    Conflict,

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store operation was cancelled")]
    Cancelled,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid token row: {0}")]
    InvalidRow(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage trait that all token stores must implement.
///
/// Implementations must enforce uniqueness of `value` themselves and report a
/// duplicate as [`StoreError::Conflict`]. `remove_by_id_and_value` must be atomic:
/// when two callers race, exactly one receives the record.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a new token and return the id assigned to it
    async fn insert(&self, token: &NewToken) -> StoreResult<String>;

    async fn find_by_value(&self, value: &str) -> StoreResult<Option<TokenRecord>>;

    async fn find_by_owner(
        &self,
        owner_type: &str,
        owner_id: &str,
    ) -> StoreResult<Vec<TokenRecord>>;

    /// Returns false when no record had this id
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Delete the record only if both `id` and `value` still match, returning it
    async fn remove_by_id_and_value(
        &self,
        id: &str,
        value: &str,
    ) -> StoreResult<Option<TokenRecord>>;

    /// Delete every record with `expires_at < now`, returning how many were removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}
