//! String-backed enums stored on the transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use bledger_core::ledger::{Direction, TransactionState as LedgerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionDirection {
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    #[sea_orm(string_value = "CREDIT")]
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TransactionState {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

impl From<Direction> for TransactionDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Debit => Self::Debit,
            Direction::Credit => Self::Credit,
        }
    }
}

impl From<TransactionDirection> for Direction {
    fn from(direction: TransactionDirection) -> Self {
        match direction {
            TransactionDirection::Debit => Self::Debit,
            TransactionDirection::Credit => Self::Credit,
        }
    }
}

impl From<LedgerState> for TransactionState {
    fn from(state: LedgerState) -> Self {
        match state {
            LedgerState::Pending => Self::Pending,
            LedgerState::Completed => Self::Completed,
            LedgerState::Failed => Self::Failed,
            LedgerState::Reversed => Self::Reversed,
        }
    }
}

impl From<TransactionState> for LedgerState {
    fn from(state: TransactionState) -> Self {
        match state {
            TransactionState::Pending => Self::Pending,
            TransactionState::Completed => Self::Completed,
            TransactionState::Failed => Self::Failed,
            TransactionState::Reversed => Self::Reversed,
        }
    }
}
