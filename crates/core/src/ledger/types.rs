//! Ledger domain types for single-leg transactions.
//!
//! A transaction moves one amount against exactly one account. Its
//! direction says which way the balance moves and its state records where it
//! is in the lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use bledger_shared::types::{AccountId, Money, TransactionId};

/// Which way a transaction moves the account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Decreases the account balance.
    Debit,
    /// Increases the account balance.
    Credit,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction lifecycle state.
///
/// The valid transitions are:
/// - new → Pending | Failed (pending path)
/// - new → Completed (immediate path)
/// - Pending → Completed (execute)
/// - Completed → Reversed (reverse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionState {
    /// Created, balance already adjusted, not yet cleared.
    Pending,
    /// Cleared.
    Completed,
    /// Rejected at creation; the balance was never touched.
    Failed,
    /// A completed transaction whose effect has been undone.
    Reversed,
}

impl TransactionState {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Reversed => "REVERSED",
        }
    }

    /// Returns true if the transaction can be executed.
    #[must_use]
    pub const fn is_completable(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the transaction can be reversed.
    #[must_use]
    pub const fn is_reversible(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if no direct transition leaves this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Reversed)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to move money against an account.
///
/// This is both the body of the create endpoints and the payload kept in an
/// idempotency lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Amount and currency to move.
    pub money: Money,
    /// Free-text annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Debit or credit.
    pub direction: Direction,
    /// Account the transaction applies to.
    pub account_id: AccountId,
}

/// Input for opening an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
}

/// An account and its current balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Current balance; its currency is fixed when the account is opened.
    pub balance: Money,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last balance change.
    pub updated_at: DateTime<Utc>,
}

/// A single-leg transaction against one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Account the transaction applies to.
    pub account_id: AccountId,
    /// Amount moved.
    pub money: Money,
    /// Current direction; flipped by a reversal.
    pub direction: Direction,
    /// Free-text annotation.
    pub memo: Option<String>,
    /// Lifecycle state.
    pub state: TransactionState,
    /// Why the transaction failed, set only when FAILED.
    pub error_reason: Option<String>,
    /// Write counter, incremented on every update.
    pub version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bledger_shared::types::Currency;

    #[test]
    fn test_direction_flip() {
        assert_eq!(Direction::Debit.flipped(), Direction::Credit);
        assert_eq!(Direction::Credit.flipped(), Direction::Debit);
        assert_eq!(Direction::Debit.flipped().flipped(), Direction::Debit);
    }

    #[test]
    fn test_state_predicates() {
        assert!(TransactionState::Pending.is_completable());
        assert!(!TransactionState::Completed.is_completable());
        assert!(!TransactionState::Failed.is_completable());
        assert!(!TransactionState::Reversed.is_completable());

        assert!(TransactionState::Completed.is_reversible());
        assert!(!TransactionState::Pending.is_reversible());

        assert!(TransactionState::Failed.is_terminal());
        assert!(TransactionState::Reversed.is_terminal());
        assert!(!TransactionState::Completed.is_terminal());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(Direction::Credit).unwrap(),
            serde_json::json!("CREDIT")
        );
        assert_eq!(
            serde_json::to_value(TransactionState::Reversed).unwrap(),
            serde_json::json!("REVERSED")
        );
        assert_eq!(TransactionState::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_request_deserializes_without_memo() {
        let account_id = AccountId::new();
        let request: TransactionRequest = serde_json::from_value(serde_json::json!({
            "money": {"amount": 10, "currency": "USD"},
            "direction": "DEBIT",
            "account_id": account_id,
        }))
        .unwrap();

        assert_eq!(request.money, Money::new(10, Currency::usd()));
        assert_eq!(request.direction, Direction::Debit);
        assert_eq!(request.account_id, account_id);
        assert!(request.memo.is_none());
    }

    #[test]
    fn test_request_rejects_unknown_direction() {
        let result = serde_json::from_value::<TransactionRequest>(serde_json::json!({
            "money": {"amount": 10, "currency": "USD"},
            "direction": "SIDEWAYS",
            "account_id": AccountId::new(),
        }));
        assert!(result.is_err());
    }
}
