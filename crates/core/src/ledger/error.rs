//! Ledger error types for validation, state and infrastructure errors.

use thiserror::Error;

use bledger_shared::AppError;
use bledger_shared::types::{AccountId, Currency, TransactionId};

use super::types::TransactionState;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Validation Errors ==========
    /// Transaction currency differs from the account currency.
    #[error("Currency mismatch: account holds {expected}, transaction is in {actual}")]
    CurrencyMismatch {
        /// Account currency.
        expected: Currency,
        /// Transaction currency.
        actual: Currency,
    },

    /// Debit exceeds the available balance.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance before the debit.
        balance: u64,
        /// Debit amount.
        requested: u64,
    },

    /// Credit would overflow the balance.
    #[error("Balance overflow")]
    BalanceOverflow,

    /// Transaction amount cannot be zero.
    #[error("Transaction amount cannot be zero")]
    ZeroAmount,

    // ========== State Errors ==========
    /// The transaction is not in a state that allows this transition.
    #[error("Cannot transition transaction from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: TransactionState,
        /// Requested state.
        to: TransactionState,
    },

    // ========== Storage Errors ==========
    /// A stored money blob could not be decoded.
    #[error("Stored money value is corrupt: {0}")]
    CorruptMoney(String),

    /// The row changed between the locked read and the write.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Waiting for a row lock exceeded the configured timeout.
    #[error("Timed out waiting for a row lock, please retry")]
    LockTimeout,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceOverflow => "BALANCE_OVERFLOW",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::CorruptMoney(_) => "CORRUPT_MONEY",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::LockTimeout => "LOCK_TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::CurrencyMismatch { .. } | Self::BalanceOverflow | Self::ZeroAmount => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::TransactionNotFound(_) => 404,

            // 409 Conflict - state and concurrency errors
            Self::InvalidStateTransition { .. } | Self::ConcurrentModification => 409,

            // 422 Unprocessable Entity
            Self::InsufficientFunds { .. } => 422,

            // 503 Service Unavailable
            Self::LockTimeout => 503,

            // 500 Internal Server Error
            Self::CorruptMoney(_) | Self::Database(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification | Self::LockTimeout)
    }

    /// Short reason recorded on a transaction persisted as FAILED.
    #[must_use]
    pub const fn failure_reason(&self) -> &'static str {
        match self {
            Self::CurrencyMismatch { .. } => "invalid currency",
            Self::InsufficientFunds { .. } => "insufficient funds",
            Self::BalanceOverflow => "balance overflow",
            Self::ZeroAmount => "zero amount",
            _ => "rejected",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::AccountNotFound(_) | LedgerError::TransactionNotFound(_) => {
                Self::NotFound(message)
            }
            LedgerError::CurrencyMismatch { .. }
            | LedgerError::BalanceOverflow
            | LedgerError::ZeroAmount => Self::Validation(message),
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds(message),
            LedgerError::InvalidStateTransition { .. } => Self::InvalidStateTransition(message),
            LedgerError::ConcurrentModification => Self::Conflict(message),
            LedgerError::LockTimeout => Self::Unavailable(message),
            LedgerError::Database(_) => Self::Database(message),
            LedgerError::CorruptMoney(_) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LedgerError::AccountNotFound(AccountId::new()), 404)]
    #[case(LedgerError::ZeroAmount, 400)]
    #[case(LedgerError::InsufficientFunds { balance: 1, requested: 2 }, 422)]
    #[case(
        LedgerError::InvalidStateTransition {
            from: TransactionState::Pending,
            to: TransactionState::Reversed,
        },
        409
    )]
    #[case(LedgerError::LockTimeout, 503)]
    #[case(LedgerError::Database("down".to_string()), 500)]
    fn test_status_matches_app_error(#[case] err: LedgerError, #[case] status: u16) {
        assert_eq!(err.http_status_code(), status);
        assert_eq!(AppError::from(err).status_code(), status);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::ConcurrentModification.is_retryable());
        assert!(LedgerError::LockTimeout.is_retryable());
        assert!(!LedgerError::ZeroAmount.is_retryable());
        assert!(!LedgerError::BalanceOverflow.is_retryable());
    }

    #[test]
    fn test_failure_reasons() {
        let mismatch = LedgerError::CurrencyMismatch {
            expected: Currency::usd(),
            actual: "EUR".parse().unwrap(),
        };
        assert_eq!(mismatch.failure_reason(), "invalid currency");
        assert_eq!(
            LedgerError::InsufficientFunds { balance: 0, requested: 1 }.failure_reason(),
            "insufficient funds"
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            balance: 100,
            requested: 150,
        };
        assert_eq!(err.to_string(), "Insufficient funds: balance 100, requested 150");

        let err = LedgerError::InvalidStateTransition {
            from: TransactionState::Failed,
            to: TransactionState::Reversed,
        };
        assert_eq!(err.to_string(), "Cannot transition transaction from FAILED to REVERSED");
    }
}
