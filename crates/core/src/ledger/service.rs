//! Ledger service implementing the transaction state machine.
//!
//! Every method is a pure function of the current state and balance. The
//! caller is expected to hold the row locks and persist the returned
//! transition inside one unit of work.

use bledger_shared::PendingSettlement;
use bledger_shared::types::Money;

use super::balance::apply_delta;
use super::error::LedgerError;
use super::types::{Direction, TransactionRequest, TransactionState};

/// Result of opening a transaction on the pending path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOutcome {
    /// Accepted; the balance is adjusted now and the row is stored PENDING.
    Reserved {
        /// Balance after the eager adjustment.
        new_balance: Money,
    },
    /// Rejected; the row is stored FAILED and the balance is untouched.
    Failed {
        /// Value for the transaction's `error_reason`.
        reason: &'static str,
    },
}

/// A state change to persist together with the account balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State to store on the transaction.
    pub new_state: TransactionState,
    /// Direction to store on the transaction.
    pub direction: Direction,
    /// Balance to store on the account.
    pub new_balance: Money,
}

/// Stateless service for ledger transitions.
pub struct LedgerService;

impl LedgerService {
    /// Checks request fields that do not depend on the account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::ZeroAmount` if nothing would move.
    pub fn validate_request(request: &TransactionRequest) -> Result<(), LedgerError> {
        if request.money.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        Ok(())
    }

    /// Opens a transaction on the pending path.
    ///
    /// Currency mismatch and insufficient funds do not abort: they produce a
    /// `Failed` outcome so the attempt is kept as a record.
    ///
    /// # Errors
    ///
    /// Returns `BalanceOverflow` if a credit does not fit, which is not
    /// recorded as a failed row.
    pub fn open_pending(
        balance: &Money,
        request: &TransactionRequest,
    ) -> Result<PendingOutcome, LedgerError> {
        match apply_delta(balance, &request.money, request.direction) {
            Ok(new_balance) => Ok(PendingOutcome::Reserved { new_balance }),
            Err(
                err @ (LedgerError::CurrencyMismatch { .. } | LedgerError::InsufficientFunds { .. }),
            ) => Ok(PendingOutcome::Failed {
                reason: err.failure_reason(),
            }),
            Err(err) => Err(err),
        }
    }

    /// Executes a pending transaction.
    ///
    /// With `PendingSettlement::Reapply` the delta is applied again on top of
    /// the adjustment made at creation. With `StateOnly` the balance is left
    /// as it is.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the transaction is PENDING
    /// - any balance error from re-applying the delta
    pub fn execute(
        current: TransactionState,
        balance: &Money,
        money: &Money,
        direction: Direction,
        settlement: PendingSettlement,
    ) -> Result<Transition, LedgerError> {
        let apply = matches!(settlement, PendingSettlement::Reapply);
        Self::complete(current, balance, money, direction, apply)
    }

    /// Clears a freshly inserted PENDING row on the immediate path.
    ///
    /// Nothing was reserved for the row, so the delta is always applied.
    ///
    /// # Errors
    ///
    /// Any balance error; the caller must roll back the insert.
    pub fn clear(balance: &Money, request: &TransactionRequest) -> Result<Transition, LedgerError> {
        Self::complete(
            TransactionState::Pending,
            balance,
            &request.money,
            request.direction,
            true,
        )
    }

    /// Reverses a completed transaction.
    ///
    /// The direction is flipped and the delta is applied under the new
    /// direction, which undoes the original effect.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the transaction is COMPLETED
    /// - `InsufficientFunds` when undoing a credit that was already spent
    pub fn reverse(
        current: TransactionState,
        balance: &Money,
        money: &Money,
        direction: Direction,
    ) -> Result<Transition, LedgerError> {
        if !current.is_reversible() {
            return Err(LedgerError::InvalidStateTransition {
                from: current,
                to: TransactionState::Reversed,
            });
        }

        let direction = direction.flipped();
        let new_balance = apply_delta(balance, money, direction)?;

        Ok(Transition {
            new_state: TransactionState::Reversed,
            direction,
            new_balance,
        })
    }

    fn complete(
        current: TransactionState,
        balance: &Money,
        money: &Money,
        direction: Direction,
        apply: bool,
    ) -> Result<Transition, LedgerError> {
        if !current.is_completable() {
            return Err(LedgerError::InvalidStateTransition {
                from: current,
                to: TransactionState::Completed,
            });
        }

        let new_balance = if apply {
            apply_delta(balance, money, direction)?
        } else {
            balance.clone()
        };

        Ok(Transition {
            new_state: TransactionState::Completed,
            direction,
            new_balance,
        })
    }
}
