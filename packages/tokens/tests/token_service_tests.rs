// ABOUTME: Integration tests for TokenService against in-memory and stub stores
// ABOUTME: Covers issuance, expiry at load time, ownership checks, retries, and consumption

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;

use tether_tokens::{
    InMemoryTokenStore, IssueOptions, NewToken, OwnerRef, ServiceConfig, StoreError,
    StoreResult, TokenConfig, TokenErrorKind, TokenOwner, TokenRecord, TokenService, TokenStore,
};

/// Store wrapper that can inject conflicts, delays, and failures
#[derive(Default)]
struct StubStore {
    inner: InMemoryTokenStore,
    forced_conflicts: AtomicUsize,
    insert_calls: AtomicUsize,
    lookups: AtomicUsize,
    lookup_delay: Option<StdDuration>,
    // Lookups report a different id, as if the value had been reissued since
    stale_lookups: bool,
    broken: bool,
}

impl StubStore {
    fn with_conflicts(count: usize) -> Self {
        Self {
            forced_conflicts: AtomicUsize::new(count),
            ..Default::default()
        }
    }

    fn fail_if_broken(&self) -> StoreResult<()> {
        if self.broken {
            return Err(StoreError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for StubStore {
    async fn insert(&self, token: &NewToken) -> StoreResult<String> {
        self.fail_if_broken()?;
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let forced = self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if forced.is_ok() {
            return Err(StoreError::Conflict);
        }
        self.inner.insert(token).await
    }

    async fn find_by_value(&self, value: &str) -> StoreResult<Option<TokenRecord>> {
        self.fail_if_broken()?;
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        let found = self.inner.find_by_value(value).await?;
        if self.stale_lookups {
            return Ok(found.map(|record| TokenRecord {
                id: "stale".to_string(),
                ..record
            }));
        }
        Ok(found)
    }

    async fn find_by_owner(
        &self,
        owner_type: &str,
        owner_id: &str,
    ) -> StoreResult<Vec<TokenRecord>> {
        self.fail_if_broken()?;
        self.inner.find_by_owner(owner_type, owner_id).await
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.fail_if_broken()?;
        self.inner.delete(id).await
    }

    async fn remove_by_id_and_value(
        &self,
        id: &str,
        value: &str,
    ) -> StoreResult<Option<TokenRecord>> {
        self.fail_if_broken()?;
        self.inner.remove_by_id_and_value(id, value).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        self.fail_if_broken()?;
        self.inner.delete_expired(now).await
    }
}

/// Entity type implementing TokenOwner directly
struct Invitation {
    id: Option<i64>,
}

impl TokenOwner for Invitation {
    fn owner_type(&self) -> &str {
        "Invitation"
    }

    fn owner_id(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
}

fn setup_service() -> TokenService {
    TokenService::new(Arc::new(InMemoryTokenStore::new()))
}

fn user(id: i64) -> OwnerRef {
    OwnerRef::new("User", id)
}

#[rstest]
#[case(1)]
#[case(8)]
#[case(64)]
#[case(128)]
#[case(255)]
#[case(1025)]
#[case(2048)]
#[tokio::test]
async fn test_issue_produces_configured_length(#[case] length: usize) {
    let service = setup_service();
    let config = TokenConfig::default().with_length(length);

    let record = service.issue(&user(1), &config).await.unwrap();

    assert_eq!(record.value.len(), length);
    assert!(record.value.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn test_issue_uses_custom_alphabet() {
    let service = setup_service();
    let config = TokenConfig::default().with_alphabet("ABCDEF0123");

    let record = service.issue(&user(1), &config).await.unwrap();

    assert_eq!(record.value.len(), 64);
    assert!(record.value.chars().all(|c| "ABCDEF0123".contains(c)));
}

#[tokio::test]
async fn test_issued_values_never_collide() {
    let service = setup_service();
    let config = TokenConfig::default();
    let mut values = std::collections::HashSet::new();

    for i in 0..500 {
        let record = service.issue(&user(i), &config).await.unwrap();
        assert!(values.insert(record.value));
    }
}

#[tokio::test]
async fn test_forced_collision_retries_then_succeeds() {
    let store = Arc::new(StubStore::with_conflicts(2));
    let service = TokenService::new(store.clone());

    let record = service.issue(&user(1), &TokenConfig::default()).await.unwrap();

    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 3);
    let found = store.inner.find_by_value(&record.value).await.unwrap();
    assert_eq!(found, Some(record));
}

#[tokio::test]
async fn test_exhausted_collision_budget_is_generation_error() {
    let store = Arc::new(StubStore::with_conflicts(usize::MAX));
    let service = TokenService::new(store.clone());

    let err = service
        .issue(&user(1), &TokenConfig::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TokenErrorKind::Generation);
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 5);
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn test_verify_without_expiry_succeeds_any_time_after_creation() {
    let service = setup_service();
    let owner = user(7);
    let record = service
        .issue_at(&owner, &TokenConfig::default(), &IssueOptions::default(), t0())
        .await
        .unwrap();

    assert_eq!(record.expires_at, None);
    for offset in [Duration::zero(), Duration::minutes(5), Duration::days(3650)] {
        let verified = service.verify(&owner, &record.value, t0() + offset).await.unwrap();
        assert_eq!(verified, record);
    }
}

#[tokio::test]
async fn test_expiry_is_enforced_at_verification_time() {
    let service = setup_service();
    let owner = user(7);
    let config = TokenConfig::default().expiring_after_minutes(180);
    let record = service
        .issue_at(&owner, &config, &IssueOptions::default(), t0())
        .await
        .unwrap();

    assert_eq!(record.expires_at, Some(t0() + Duration::minutes(180)));

    let ok = service
        .verify(&owner, &record.value, t0() + Duration::minutes(179))
        .await;
    assert!(ok.is_ok());

    let err = service
        .verify(&owner, &record.value, t0() + Duration::minutes(181))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::Expired);
    assert_eq!(err.public_message(), "The token has expired.");

    // Expiry never removes the row
    assert!(service
        .store()
        .find_by_value(&record.value)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_explicit_expiry_wins_over_default() {
    let service = setup_service();
    let owner = user(3);
    let explicit = t0() - Duration::minutes(1);
    let config = TokenConfig::default().expiring_after_minutes(60);
    let options = IssueOptions::default().expires_at(explicit).named("reset");

    let record = service.issue_at(&owner, &config, &options, t0()).await.unwrap();
    assert_eq!(record.expires_at, Some(explicit));
    assert_eq!(record.name.as_deref(), Some("reset"));

    let err = service.verify(&owner, &record.value, t0()).await.unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::Expired);
}

#[tokio::test]
async fn test_ownership_mismatch_on_id() {
    let service = setup_service();
    let record = service.issue(&user(1), &TokenConfig::default()).await.unwrap();

    let err = service
        .verify(&user(2), &record.value, Utc::now())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TokenErrorKind::OwnershipMismatch);
    assert_eq!(err.public_message(), "The token could not be found.");
}

#[tokio::test]
async fn test_ownership_mismatch_on_type() {
    let service = setup_service();
    let record = service.issue(&user(5), &TokenConfig::default()).await.unwrap();

    // Same id, different entity type
    let err = service
        .verify(&Invitation { id: Some(5) }, &record.value, Utc::now())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TokenErrorKind::OwnershipMismatch);
}

#[tokio::test]
async fn test_unresolved_owner_fails_before_lookup() {
    let store = Arc::new(StubStore::default());
    let service = TokenService::new(store.clone());

    let err = service
        .verify(&Invitation { id: None }, "12345", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::InvalidArgument);

    let err = service
        .verify(&OwnerRef::unsaved("User"), "12345", Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::InvalidArgument);

    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_issue_for_unresolved_owner_is_rejected() {
    let store = Arc::new(StubStore::default());
    let service = TokenService::new(store.clone());

    let err = service
        .issue(&Invitation { id: None }, &TokenConfig::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TokenErrorKind::InvalidArgument);
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let service = setup_service();

    let err = service
        .issue(&user(1), &TokenConfig::default().with_length(0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::InvalidArgument);

    let err = service
        .issue(&user(1), &TokenConfig::default().with_alphabet("aab"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_unrepresentable_expiry_is_rejected_not_dropped() {
    let store = Arc::new(StubStore::default());
    let service = TokenService::new(store.clone());
    let near_max = DateTime::<Utc>::MAX_UTC - Duration::minutes(1);

    let err = service
        .issue_at(
            &user(1),
            &TokenConfig::default().expiring_after_minutes(10),
            &IssueOptions::default(),
            near_max,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), TokenErrorKind::InvalidArgument);
    assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let service = setup_service();
    let err = service.verify(&user(1), "12345", Utc::now()).await.unwrap_err();

    assert_eq!(err.kind(), TokenErrorKind::NotFound);
    assert_eq!(err.public_message(), "The token could not be found.");
}

#[tokio::test]
async fn test_scenario_user_42_without_expiry() {
    let service = setup_service();
    let owner = OwnerRef::new("User", 42);
    let config = TokenConfig::default()
        .with_length(64)
        .expiring_after_minutes(0);

    let record = service.issue(&owner, &config).await.unwrap();
    assert_eq!(record.value.len(), 64);
    assert_eq!(record.expires_at, None);
    assert_eq!(record.owner_type, "User");
    assert_eq!(record.owner_id, "42");

    let verified = service.verify_now(&owner, &record.value).await.unwrap();
    assert_eq!(verified, record);
}

#[tokio::test]
async fn test_scenario_ten_minute_expiry() {
    let service = setup_service();
    let owner = user(9);
    let config = TokenConfig::default().expiring_after_minutes(10);

    let record = service
        .issue_at(&owner, &config, &IssueOptions::default(), t0())
        .await
        .unwrap();
    assert_eq!(record.created_at, t0());
    assert_eq!(record.expires_at, Some(t0() + Duration::minutes(10)));

    let err = service
        .verify(&owner, &record.value, t0() + Duration::minutes(11))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::Expired);
}

#[tokio::test]
async fn test_verify_does_not_consume() {
    let service = setup_service();
    let owner = user(1);
    let record = service.issue(&owner, &TokenConfig::default()).await.unwrap();

    let first = service.verify_now(&owner, &record.value).await.unwrap();
    let second = service.verify_now(&owner, &record.value).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_check_ignores_owner_but_enforces_expiry() {
    let service = setup_service();
    let config = TokenConfig::default().expiring_after_minutes(30);
    let record = service
        .issue_at(&user(1), &config, &IssueOptions::default(), t0())
        .await
        .unwrap();

    let checked = service.check(&record.value, t0()).await.unwrap();
    assert_eq!(checked.id, record.id);

    let err = service
        .check(&record.value, t0() + Duration::minutes(31))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::Expired);

    let err = service.check("12345", t0()).await.unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::NotFound);
}

#[tokio::test]
async fn test_consume_is_one_time() {
    let service = setup_service();
    let owner = user(1);
    let record = service.issue(&owner, &TokenConfig::default()).await.unwrap();

    let consumed = service.consume(&owner, &record.value, Utc::now()).await.unwrap();
    assert_eq!(consumed.id, record.id);

    let err = service
        .consume(&owner, &record.value, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::NotFound);
}

#[tokio::test]
async fn test_consume_rejects_other_owner_without_removing() {
    let service = setup_service();
    let record = service.issue(&user(1), &TokenConfig::default()).await.unwrap();

    let err = service
        .consume(&user(2), &record.value, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::OwnershipMismatch);

    assert!(service.verify_now(&user(1), &record.value).await.is_ok());
}

#[tokio::test]
async fn test_consume_never_removes_a_reissued_value() {
    let store = Arc::new(StubStore {
        stale_lookups: true,
        ..Default::default()
    });
    let service = TokenService::new(store.clone());
    let owner = user(1);
    let record = service.issue(&owner, &TokenConfig::default()).await.unwrap();

    let err = service
        .consume(&owner, &record.value, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::NotFound);

    let still_there = store.inner.find_by_value(&record.value).await.unwrap();
    assert_eq!(still_there, Some(record));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_consume_succeeds_once() {
    let service = setup_service();
    let owner = user(1);
    let record = service.issue(&owner, &TokenConfig::default()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        let owner = owner.clone();
        let value = record.value.clone();
        handles.push(tokio::spawn(async move {
            service.consume(&owner, &value, Utc::now()).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.kind(), TokenErrorKind::NotFound),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_revoke_and_list_for_owner() {
    let service = setup_service();
    let owner = user(1);
    let first = service.issue(&owner, &TokenConfig::default()).await.unwrap();
    let second = service.issue(&owner, &TokenConfig::default()).await.unwrap();
    service.issue(&user(2), &TokenConfig::default()).await.unwrap();

    let tokens = service.tokens_for_owner(&owner).await.unwrap();
    assert_eq!(tokens.len(), 2);

    assert!(service.revoke(&first.id).await.unwrap());
    assert!(!service.revoke(&first.id).await.unwrap());

    let tokens = service.tokens_for_owner(&owner).await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].id, second.id);

    let err = service.verify_now(&owner, &first.value).await.unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::NotFound);
}

#[tokio::test]
async fn test_purge_expired_only_when_called() {
    let service = setup_service();
    let owner = user(1);
    let short = TokenConfig::default().expiring_after_minutes(5);
    let expired = service
        .issue_at(&owner, &short, &IssueOptions::default(), t0())
        .await
        .unwrap();
    let forever = service
        .issue_at(&owner, &TokenConfig::default(), &IssueOptions::default(), t0())
        .await
        .unwrap();

    let later = t0() + Duration::minutes(10);
    // Still loadable as a record, just expired
    assert_eq!(service.tokens_for_owner(&owner).await.unwrap().len(), 2);

    assert_eq!(service.purge_expired(later).await.unwrap(), 1);

    let err = service.verify(&owner, &expired.value, later).await.unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::NotFound);
    assert!(service.verify(&owner, &forever.value, later).await.is_ok());
}

#[tokio::test]
async fn test_store_timeout_is_storage_error() {
    let store = Arc::new(StubStore {
        lookup_delay: Some(StdDuration::from_millis(500)),
        ..Default::default()
    });
    let service = TokenService::with_config(
        store,
        ServiceConfig {
            store_timeout: Some(StdDuration::from_millis(20)),
        },
    );

    let err = service.verify_now(&user(1), "12345").await.unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::Storage);
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_store_failure_is_propagated() {
    let store = Arc::new(StubStore {
        broken: true,
        ..Default::default()
    });
    let service = TokenService::new(store);

    let err = service
        .issue(&user(1), &TokenConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::Storage);
    assert!(err.to_string().contains("connection refused"));

    let err = service.verify_now(&user(1), "12345").await.unwrap_err();
    assert_eq!(err.kind(), TokenErrorKind::Storage);
}
