//! Idempotency protocol for mutating requests.
//!
//! A client sends a fingerprint of its request body in a header. The
//! coordinator recomputes the fingerprint, checks it matches, and takes a
//! lease keyed by it. A second submission within the lease TTL is rejected.

pub mod coordinator;
pub mod error;
pub mod fingerprint;
pub mod lease;

#[cfg(test)]
mod fingerprint_props;

pub use coordinator::{IdempotencyCoordinator, IdempotencyPolicy};
pub use error::{IdempotencyError, LeaseStoreError};
pub use fingerprint::Fingerprint;
pub use lease::{IdempotencyLease, LeaseStore};
