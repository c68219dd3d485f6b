//! Redis-backed lease store.
//!
//! Leases are JSON values under `il_idempotency_lock_<fingerprint>`, written
//! with `SET key value NX PX ttl` so only one caller can take a fingerprint.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::instrument;

use bledger_core::idempotency::{Fingerprint, IdempotencyLease, LeaseStore, LeaseStoreError};

/// Prefix for lease keys.
const KEY_PREFIX: &str = "il_idempotency_lock_";

/// Lease store shared across nodes through Redis.
#[derive(Clone)]
pub struct RedisLeaseStore {
    conn: ConnectionManager,
}

impl RedisLeaseStore {
    /// Connects to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `LeaseStoreError::Unavailable` if the URL is invalid or the
    /// server cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self, LeaseStoreError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| LeaseStoreError::Unavailable(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| LeaseStoreError::Unavailable(e.to_string()))?;

        Ok(Self { conn })
    }

    fn key(fingerprint: &Fingerprint) -> String {
        format!("{KEY_PREFIX}{fingerprint}")
    }
}

/// Converts a TTL to whole milliseconds, at least one.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl LeaseStore for RedisLeaseStore {
    #[instrument(skip(self), fields(fingerprint = %fingerprint))]
    async fn get(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<IdempotencyLease>, LeaseStoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(fingerprint))
            .query_async(&mut conn)
            .await
            .map_err(|e| LeaseStoreError::Unavailable(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| LeaseStoreError::Serialization(e.to_string()))
        })
        .transpose()
    }

    #[instrument(skip(self, lease), fields(fingerprint = %fingerprint))]
    async fn try_acquire(
        &self,
        fingerprint: &Fingerprint,
        lease: &IdempotencyLease,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError> {
        let payload =
            serde_json::to_string(lease).map_err(|e| LeaseStoreError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        // Nil reply means the key already exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::key(fingerprint))
            .arg(payload)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| LeaseStoreError::Unavailable(e.to_string()))?;

        Ok(reply.is_some())
    }
}
