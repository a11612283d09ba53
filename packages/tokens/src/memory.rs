// ABOUTME: In-memory TokenStore for tests and single-process embedding
// ABOUTME: Enforces value uniqueness and atomic removal under one write lock

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tether_core::{redact_token, NewToken, TokenRecord};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::store::{StoreError, StoreResult, TokenStore};

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, TokenRecord>,
    // value -> id
    by_value: HashMap<String, String>,
}

impl MemoryState {
    fn remove_id(&mut self, id: &str) -> Option<TokenRecord> {
        let record = self.records.remove(id)?;
        self.by_value.remove(&record.value);
        Some(record)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    state: RwLock<MemoryState>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, token: &NewToken) -> StoreResult<String> {
        let mut state = self.state.write().await;

        if state.by_value.contains_key(&token.value) {
            debug!("Rejecting duplicate token value {}", redact_token(&token.value));
            return Err(StoreError::Conflict);
        }

        let id = Uuid::new_v4().to_string();
        state.by_value.insert(token.value.clone(), id.clone());
        state
            .records
            .insert(id.clone(), token.clone().into_record(id.clone()));

        Ok(id)
    }

    async fn find_by_value(&self, value: &str) -> StoreResult<Option<TokenRecord>> {
        let state = self.state.read().await;
        Ok(state
            .by_value
            .get(value)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn find_by_owner(
        &self,
        owner_type: &str,
        owner_id: &str,
    ) -> StoreResult<Vec<TokenRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<TokenRecord> = state
            .records
            .values()
            .filter(|r| r.is_bound_to(owner_type, owner_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.state.write().await.remove_id(id).is_some())
    }

    async fn remove_by_id_and_value(
        &self,
        id: &str,
        value: &str,
    ) -> StoreResult<Option<TokenRecord>> {
        let mut state = self.state.write().await;
        if state.by_value.get(value).map(String::as_str) != Some(id) {
            return Ok(None);
        }
        Ok(state.remove_id(id))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let expired: Vec<String> = state
            .records
            .values()
            .filter(|r| matches!(r.expires_at, Some(at) if at < now))
            .map(|r| r.id.clone())
            .collect();

        for id in &expired {
            state.remove_id(id);
        }

        Ok(expired.len() as u64)
    }
}
