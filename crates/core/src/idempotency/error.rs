//! Idempotency error types.

use thiserror::Error;

use bledger_shared::AppError;

/// Errors raised by a lease store backend.
#[derive(Debug, Error)]
pub enum LeaseStoreError {
    /// The backend could not be reached or rejected the command.
    #[error("Lease store unavailable: {0}")]
    Unavailable(String),

    /// A stored lease could not be encoded or decoded.
    #[error("Lease serialization failed: {0}")]
    Serialization(String),
}

/// Errors raised while admitting a request.
#[derive(Debug, Error)]
pub enum IdempotencyError {
    /// The request carried no idempotency key.
    #[error("Missing idempotency key")]
    MissingKey,

    /// The key does not match the fingerprint of the body.
    #[error("Idempotency key does not match the request")]
    KeyMismatch,

    /// A lease for this fingerprint is still held.
    #[error("Request was already submitted: {0}")]
    Duplicate(String),

    /// The body cannot be fingerprinted.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The lease store failed.
    #[error(transparent)]
    Store(#[from] LeaseStoreError),
}

impl IdempotencyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingKey => "IDEMPOTENCY_KEY_MISSING",
            Self::KeyMismatch => "IDEMPOTENCY_KEY_MISMATCH",
            Self::Duplicate(_) => "DUPLICATE_REQUEST",
            Self::InvalidRequest(_) => "VALIDATION_ERROR",
            Self::Store(_) => "LEASE_STORE_UNAVAILABLE",
        }
    }
}

impl From<IdempotencyError> for AppError {
    fn from(err: IdempotencyError) -> Self {
        let message = err.to_string();
        match err {
            IdempotencyError::MissingKey | IdempotencyError::KeyMismatch => {
                Self::Idempotency(message)
            }
            IdempotencyError::Duplicate(_) => Self::DuplicateRequest(message),
            IdempotencyError::InvalidRequest(_) => Self::Validation(message),
            IdempotencyError::Store(_) => Self::Unavailable(message),
        }
    }
}
