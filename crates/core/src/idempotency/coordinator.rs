//! Admission of mutating requests.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bledger_shared::IdempotencyConfig;

use super::error::IdempotencyError;
use super::fingerprint::Fingerprint;
use super::lease::{IdempotencyLease, LeaseStore};
use crate::ledger::TransactionRequest;

/// Which requests need a key and how long a lease lives.
#[derive(Debug, Clone)]
pub struct IdempotencyPolicy {
    ttl: Duration,
    whitelisted_methods: HashSet<String>,
    whitelisted_routes: HashSet<String>,
}

impl IdempotencyPolicy {
    /// Creates a policy with no allow-listed routes.
    #[must_use]
    pub fn new(ttl: Duration, whitelisted_methods: &[&str]) -> Self {
        Self {
            ttl,
            whitelisted_methods: whitelisted_methods.iter().map(|m| (*m).to_string()).collect(),
            whitelisted_routes: HashSet::new(),
        }
    }

    /// Builds the policy from configuration.
    #[must_use]
    pub fn from_config(config: &IdempotencyConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
            whitelisted_methods: config.whitelisted_methods.iter().cloned().collect(),
            whitelisted_routes: config.whitelisted_routes.iter().cloned().collect(),
        }
    }

    /// Adds an exact path to the allow-list.
    #[must_use]
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.whitelisted_routes.insert(route.into());
        self
    }

    /// Returns the lease TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Exact-match allow-list check on method or path.
    #[must_use]
    pub fn is_whitelisted(&self, method: &str, path: &str) -> bool {
        self.whitelisted_methods.contains(method) || self.whitelisted_routes.contains(path)
    }
}

/// Checks keys against request bodies and takes leases.
pub struct IdempotencyCoordinator {
    store: Arc<dyn LeaseStore>,
    policy: IdempotencyPolicy,
}

impl IdempotencyCoordinator {
    /// Creates a coordinator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LeaseStore>, policy: IdempotencyPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &IdempotencyPolicy {
        &self.policy
    }

    /// Admits a request or rejects it.
    ///
    /// Steps, in order: the key must be present, it must equal the
    /// fingerprint of `request`, no lease may exist for it, and the lease must
    /// be taken with a conditional write. The lease is kept for its TTL
    /// whatever happens to the request afterwards.
    ///
    /// # Errors
    ///
    /// - `MissingKey`, `KeyMismatch`, `InvalidRequest` for a bad key or body
    /// - `Duplicate` if a lease is already held
    /// - `Store` if the backend fails
    #[tracing::instrument(skip(self, key, request), fields(account_id = %request.account_id))]
    pub async fn admit(
        &self,
        key: Option<&str>,
        request: &TransactionRequest,
    ) -> Result<Fingerprint, IdempotencyError> {
        let key = key
            .filter(|k| !k.is_empty())
            .ok_or(IdempotencyError::MissingKey)?;

        let fingerprint = Fingerprint::of_request(request)?;
        if !fingerprint.matches(key) {
            tracing::warn!("Idempotency key does not match request body");
            return Err(IdempotencyError::KeyMismatch);
        }

        if self.store.get(&fingerprint).await?.is_some() {
            tracing::info!(%fingerprint, "Duplicate submission rejected");
            return Err(IdempotencyError::Duplicate(fingerprint.to_string()));
        }

        let lease = IdempotencyLease::locked(request.clone());
        if !self
            .store
            .try_acquire(&fingerprint, &lease, self.policy.ttl)
            .await?
        {
            tracing::info!(%fingerprint, "Lost lease race to a concurrent submission");
            return Err(IdempotencyError::Duplicate(fingerprint.to_string()));
        }

        tracing::debug!(%fingerprint, ttl_secs = self.policy.ttl.as_secs(), "Lease acquired");
        Ok(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idempotency::error::LeaseStoreError;
    use crate::idempotency::lease::MockLeaseStore;
    use crate::ledger::Direction;
    use bledger_shared::types::{AccountId, Currency, Money};
    use mockall::predicate::always;

    fn request() -> TransactionRequest {
        TransactionRequest {
            money: Money::new(100, Currency::usd()),
            memo: None,
            direction: Direction::Credit,
            account_id: AccountId::new(),
        }
    }

    fn coordinator(store: MockLeaseStore) -> IdempotencyCoordinator {
        IdempotencyCoordinator::new(
            Arc::new(store),
            IdempotencyPolicy::new(Duration::from_secs(60), &["GET"]),
        )
    }

    fn key_for(request: &TransactionRequest) -> String {
        Fingerprint::of_request(request).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_missing_key_rejected_without_store_access() {
        let coord = coordinator(MockLeaseStore::new());
        let err = coord.admit(None, &request()).await.unwrap_err();
        assert!(matches!(err, IdempotencyError::MissingKey));
        let err = coord.admit(Some(""), &request()).await.unwrap_err();
        assert!(matches!(err, IdempotencyError::MissingKey));
    }

    #[tokio::test]
    async fn test_mismatched_key_rejected() {
        let coord = coordinator(MockLeaseStore::new());
        let other = key_for(&request());
        let err = coord.admit(Some(&other), &request()).await.unwrap_err();
        assert!(matches!(err, IdempotencyError::KeyMismatch));
    }

    #[tokio::test]
    async fn test_first_submission_takes_lease() {
        let req = request();
        let key = key_for(&req);
        let mut store = MockLeaseStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));
        store
            .expect_try_acquire()
            .with(always(), always(), mockall::predicate::eq(Duration::from_secs(60)))
            .times(1)
            .returning(|_, lease, _| {
                assert!(lease.locked);
                Ok(true)
            });

        let fp = coordinator(store).admit(Some(&key), &req).await.unwrap();
        assert_eq!(fp.as_str(), key);
    }

    #[tokio::test]
    async fn test_existing_lease_is_duplicate() {
        let req = request();
        let key = key_for(&req);
        let held = IdempotencyLease::locked(req.clone());
        let mut store = MockLeaseStore::new();
        store
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(held.clone())));
        store.expect_try_acquire().never();

        let err = coordinator(store).admit(Some(&key), &req).await.unwrap_err();
        assert!(matches!(err, IdempotencyError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_lost_race_is_duplicate() {
        let req = request();
        let key = key_for(&req);
        let mut store = MockLeaseStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_try_acquire().returning(|_, _, _| Ok(false));

        let err = coordinator(store).admit(Some(&key), &req).await.unwrap_err();
        assert!(matches!(err, IdempotencyError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let req = request();
        let key = key_for(&req);
        let mut store = MockLeaseStore::new();
        store
            .expect_get()
            .returning(|_| Err(LeaseStoreError::Unavailable("connection refused".to_string())));

        let err = coordinator(store).admit(Some(&key), &req).await.unwrap_err();
        assert!(matches!(err, IdempotencyError::Store(_)));
    }

    #[test]
    fn test_whitelist_is_exact() {
        let policy = IdempotencyPolicy::new(Duration::from_secs(1), &["GET"]).with_route("/health");
        assert!(policy.is_whitelisted("GET", "/v1/transactions"));
        assert!(policy.is_whitelisted("POST", "/health"));
        assert!(!policy.is_whitelisted("get", "/v1/transactions"));
        assert!(!policy.is_whitelisted("POST", "/health/"));
        assert!(!policy.is_whitelisted("POST", "/v1/transactions"));
    }

    #[test]
    fn test_policy_from_config() {
        let config = IdempotencyConfig {
            whitelisted_routes: vec!["/v1/accounts".to_string()],
            ..IdempotencyConfig::default()
        };
        let policy = IdempotencyPolicy::from_config(&config);
        assert_eq!(policy.ttl(), Duration::from_secs(config.ttl_secs));
        assert!(policy.is_whitelisted("HEAD", "/x"));
        assert!(policy.is_whitelisted("POST", "/v1/accounts"));
    }
}
