//! Single-leg ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Domain types for accounts and transactions
//! - Balance mutation with currency and overflow checks
//! - The transaction state machine (pending, execute, clear, reverse)
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::{apply_delta, ensure_same_currency};
pub use error::LedgerError;
pub use service::{LedgerService, PendingOutcome, Transition};
pub use types::{
    Account, CreateAccountRequest, Direction, Transaction, TransactionRequest, TransactionState,
};
