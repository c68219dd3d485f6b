//! Idempotency leases and the store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::LeaseStoreError;
use super::fingerprint::Fingerprint;
use crate::ledger::TransactionRequest;

/// Value held under a fingerprint while its lease is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyLease {
    /// Always true for a lease that was written.
    #[serde(rename = "Lock")]
    pub locked: bool,
    /// The request that took the lease.
    #[serde(rename = "Body")]
    pub body: TransactionRequest,
}

impl IdempotencyLease {
    /// Creates a locked lease for `body`.
    #[must_use]
    pub const fn locked(body: TransactionRequest) -> Self {
        Self { locked: true, body }
    }
}

/// Key-value store with TTL holding idempotency leases.
///
/// Implementations must make `try_acquire` a conditional write: two
/// concurrent callers with the same fingerprint must not both get `true`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Returns the active lease for `fingerprint`, if any.
    async fn get(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<IdempotencyLease>, LeaseStoreError>;

    /// Stores `lease` for `ttl` unless a lease already exists.
    ///
    /// Returns `false` when another lease holds the fingerprint.
    async fn try_acquire(
        &self,
        fingerprint: &Fingerprint,
        lease: &IdempotencyLease,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError>;
}
