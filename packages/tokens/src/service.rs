// ABOUTME: TokenService orchestrating issuance, verification, and explicit lifecycle actions
// ABOUTME: Generation, expiry stamping, ownership checks, and bounded collision retry

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tether_core::{
    redact_token, validate_owner, NewToken, TokenOwner, TokenRecord, MAX_GENERATION_ATTEMPTS,
};
use tracing::{debug, error, info, warn};

use crate::config::{IssueOptions, ServiceConfig, TokenConfig};
use crate::error::{TokenError, TokenResult};
use crate::expiry::ExpiryPolicy;
use crate::generator::RandomStringGenerator;
use crate::store::{StoreError, StoreResult, TokenStore};

/// Entry point for callers: issue tokens for owners and verify presented tokens
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    config: ServiceConfig,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: Arc<dyn TokenStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Issue a token for `owner` using the current time
    pub async fn issue<O: TokenOwner + ?Sized>(
        &self,
        owner: &O,
        config: &TokenConfig,
    ) -> TokenResult<TokenRecord> {
        self.issue_at(owner, config, &IssueOptions::default(), Utc::now())
            .await
    }

    pub async fn issue_with<O: TokenOwner + ?Sized>(
        &self,
        owner: &O,
        config: &TokenConfig,
        options: &IssueOptions,
    ) -> TokenResult<TokenRecord> {
        self.issue_at(owner, config, options, Utc::now()).await
    }

    /// Issue a token created at `now`.
    ///
    /// Draws a fresh value on every store conflict, up to
    /// `MAX_GENERATION_ATTEMPTS` times, then gives up with `Generation`.
    pub async fn issue_at<O: TokenOwner + ?Sized>(
        &self,
        owner: &O,
        config: &TokenConfig,
        options: &IssueOptions,
        now: DateTime<Utc>,
    ) -> TokenResult<TokenRecord> {
        let owner_type = owner.owner_type().to_string();
        let owner_id = validate_owner(owner)?;
        config.validate()?;

        let generator = RandomStringGenerator::new(&config.alphabet)?;
        let expires_at =
            ExpiryPolicy::new(config.expires_after_minutes).stamp(options.expires_at, now)?;

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let token = NewToken {
                value: generator.generate(config.token_length)?,
                name: options.name.clone(),
                owner_type: owner_type.clone(),
                owner_id: owner_id.clone(),
                created_at: now,
                expires_at,
            };

            match self.run(self.store.insert(&token)).await {
                Ok(id) => {
                    info!(
                        "Issued token {} for {}#{} (expires: {:?})",
                        id, owner_type, owner_id, expires_at
                    );
                    return Ok(token.into_record(id));
                }
                Err(StoreError::Conflict) => {
                    warn!(
                        "Token value collision on attempt {}/{} for {}#{}",
                        attempt, MAX_GENERATION_ATTEMPTS, owner_type, owner_id
                    );
                }
                Err(e) => {
                    error!("Failed to store token for {}#{}: {}", owner_type, owner_id, e);
                    return Err(e.into());
                }
            }
        }

        error!(
            "Giving up on token for {}#{} after {} colliding values",
            owner_type, owner_id, MAX_GENERATION_ATTEMPTS
        );
        Err(TokenError::Generation(format!(
            "could not produce a unique token after {} attempts",
            MAX_GENERATION_ATTEMPTS
        )))
    }

    /// Load the token `value` and check it is bound to `owner` and not expired at `now`.
    ///
    /// The owner must be persisted; an unsaved owner fails before the store is queried.
    /// Verification does not consume the token.
    pub async fn verify<O: TokenOwner + ?Sized>(
        &self,
        owner: &O,
        value: &str,
        now: DateTime<Utc>,
    ) -> TokenResult<TokenRecord> {
        let owner_id = validate_owner(owner)?;
        let owner_type = owner.owner_type();

        let record = self.load(value).await?;

        if !record.is_bound_to(owner_type, &owner_id) {
            warn!(
                "Token {} presented for {}#{} but is bound to {}#{}",
                redact_token(value),
                owner_type,
                owner_id,
                record.owner_type,
                record.owner_id
            );
            return Err(TokenError::OwnershipMismatch);
        }

        if let Err(e) = ExpiryPolicy::ensure_not_expired(&record, now) {
            debug!("Token {} for {}#{} is expired", record.id, owner_type, owner_id);
            return Err(e);
        }

        Ok(record)
    }

    pub async fn verify_now<O: TokenOwner + ?Sized>(
        &self,
        owner: &O,
        value: &str,
    ) -> TokenResult<TokenRecord> {
        self.verify(owner, value, Utc::now()).await
    }

    /// Check that a token exists and is not expired, without an owner binding
    pub async fn check(&self, value: &str, now: DateTime<Utc>) -> TokenResult<TokenRecord> {
        let record = self.load(value).await?;
        ExpiryPolicy::ensure_not_expired(&record, now)?;
        Ok(record)
    }

    /// Verify and then atomically remove the token so it cannot be used again.
    ///
    /// When two callers race on the same token only one gets the record; the
    /// other sees `NotFound`.
    pub async fn consume<O: TokenOwner + ?Sized>(
        &self,
        owner: &O,
        value: &str,
        now: DateTime<Utc>,
    ) -> TokenResult<TokenRecord> {
        let record = self.verify(owner, value, now).await?;

        match self
            .run(self.store.remove_by_id_and_value(&record.id, value))
            .await?
        {
            Some(removed) => {
                info!("Consumed token {}", removed.id);
                Ok(removed)
            }
            None => {
                debug!("Token {} already consumed by another caller", record.id);
                Err(TokenError::NotFound)
            }
        }
    }

    /// Delete a token by id; returns false if it did not exist
    pub async fn revoke(&self, id: &str) -> TokenResult<bool> {
        let deleted = self.run(self.store.delete(id)).await?;
        if deleted {
            info!("Revoked token {}", id);
        }
        Ok(deleted)
    }

    /// All tokens bound to `owner`, expired ones included
    pub async fn tokens_for_owner<O: TokenOwner + ?Sized>(
        &self,
        owner: &O,
    ) -> TokenResult<Vec<TokenRecord>> {
        let owner_id = validate_owner(owner)?;
        Ok(self
            .run(self.store.find_by_owner(owner.owner_type(), &owner_id))
            .await?)
    }

    /// Delete tokens that expired before `now`. Only runs when called.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> TokenResult<u64> {
        let removed = self.run(self.store.delete_expired(now)).await?;
        info!("Purged {} expired tokens", removed);
        Ok(removed)
    }

    async fn load(&self, value: &str) -> TokenResult<TokenRecord> {
        match self.run(self.store.find_by_value(value)).await? {
            Some(record) => Ok(record),
            None => {
                debug!("No token matches {}", redact_token(value));
                Err(TokenError::NotFound)
            }
        }
    }

    /// Apply the configured store timeout to a single store call
    async fn run<T>(&self, op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        match self.config.store_timeout {
            Some(limit) => tokio::time::timeout(limit, op)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => op.await,
        }
    }
}
