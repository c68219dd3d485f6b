//! In-process lease store using Moka.
//!
//! Leases leave the cache only by expiring. The capacity is an admission
//! limit: a full store refuses new leases instead of evicting live ones.

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::notification::RemovalCause;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bledger_core::idempotency::{Fingerprint, IdempotencyLease, LeaseStore, LeaseStoreError};

/// Default admission limit (number of unexpired leases).
const DEFAULT_CAPACITY: u64 = 100_000;

#[derive(Debug)]
struct StoredLease {
    lease: IdempotencyLease,
    ttl: Duration,
}

/// Expires each lease after the TTL it was stored with.
struct LeaseExpiry;

impl Expiry<String, Arc<StoredLease>> for LeaseExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Arc<StoredLease>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Lease store backed by a Moka cache.
///
/// Thread-safe and cheap to clone. Leases past their TTL are invisible to
/// `get` and can be acquired again.
#[derive(Clone)]
pub struct MemoryLeaseStore {
    cache: Cache<String, Arc<StoredLease>>,
    live: Arc<AtomicU64>,
    max_leases: u64,
}

impl MemoryLeaseStore {
    /// Creates a store with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a store admitting at most `max_leases` unexpired leases.
    #[must_use]
    pub fn with_capacity(max_leases: u64) -> Self {
        let live = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&live);
        let cache = Cache::builder()
            .expire_after(LeaseExpiry)
            .eviction_listener(move |_key, _value, cause| {
                if cause != RemovalCause::Replaced {
                    let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        Some(n.saturating_sub(1))
                    });
                }
            })
            .build();

        Self {
            cache,
            live,
            max_leases,
        }
    }

    /// Returns true if no new lease can be admitted.
    ///
    /// The live count is decremented lazily, so pending expirations are
    /// flushed before refusing.
    async fn is_full(&self) -> bool {
        if self.live.load(Ordering::Acquire) < self.max_leases {
            return false;
        }
        self.cache.run_pending_tasks().await;
        self.live.load(Ordering::Acquire) >= self.max_leases
    }
}

impl Default for MemoryLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn get(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<IdempotencyLease>, LeaseStoreError> {
        Ok(self
            .cache
            .get(fingerprint.as_str())
            .await
            .map(|stored| stored.lease.clone()))
    }

    async fn try_acquire(
        &self,
        fingerprint: &Fingerprint,
        lease: &IdempotencyLease,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError> {
        let key = fingerprint.to_string();
        if self.cache.contains_key(&key) {
            return Ok(false);
        }
        if self.is_full().await {
            tracing::warn!(max_leases = self.max_leases, "Lease store is full");
            return Err(LeaseStoreError::Unavailable(format!(
                "lease store is full ({} leases)",
                self.max_leases
            )));
        }

        let stored = Arc::new(StoredLease {
            lease: lease.clone(),
            ttl,
        });
        let entry = self
            .cache
            .entry(key)
            .or_insert_with(async move { stored })
            .await;

        if entry.is_fresh() {
            self.live.fetch_add(1, Ordering::AcqRel);
        }
        Ok(entry.is_fresh())
    }
}
