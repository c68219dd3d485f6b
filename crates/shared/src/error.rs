//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every failure the ledger can produce is folded into one of these before it
/// reaches the transport layer, which renders it as `{status, error, message}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (malformed request, currency mismatch, zero amount).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A debit exceeds the available balance.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The transaction is not in a state that allows the requested transition.
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Missing or mismatched idempotency key.
    #[error("Idempotency violation: {0}")]
    Idempotency(String),

    /// The same request was already submitted within the lease window.
    #[error("Duplicate request: {0}")]
    DuplicateRequest(String),

    /// Concurrent modification detected; the caller may retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A backing service is unavailable or a lock wait timed out.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::InsufficientFunds(_) => 422,
            Self::Idempotency(_) => 403,
            Self::InvalidStateTransition(_) | Self::DuplicateRequest(_) | Self::Conflict(_) => 409,
            Self::Unavailable(_) => 503,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            Self::Idempotency(_) => "IDEMPOTENCY_VIOLATION",
            Self::DuplicateRequest(_) => "DUPLICATE_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may resubmit the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Unavailable(_))
    }

    /// Returns the message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::Validation(m)
            | Self::InsufficientFunds(m)
            | Self::InvalidStateTransition(m)
            | Self::Idempotency(m)
            | Self::DuplicateRequest(m)
            | Self::Conflict(m)
            | Self::Unavailable(m)
            | Self::Database(m)
            | Self::Internal(m) => m,
        }
    }
}
