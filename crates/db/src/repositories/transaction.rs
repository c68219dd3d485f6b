//! Transaction repository for single-leg ledger transactions.

use chrono::{FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};

use bledger_core::ledger::{Direction, LedgerError, Transaction, TransactionState};
use bledger_shared::types::{AccountId, Money, TransactionId};

use super::account::{decode_money, encode_money};
use crate::entities::{
    sea_orm_active_enums::{TransactionDirection, TransactionState as StoredState},
    transactions,
};
use crate::error::db_error;

/// Version stored on a freshly inserted row.
const INITIAL_VERSION: i64 = 1;

impl TryFrom<transactions::Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: transactions::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TransactionId::from_uuid(model.id),
            account_id: AccountId::from_uuid(model.account_id),
            money: decode_money(&model.money)?,
            direction: model.direction.into(),
            memo: model.memo,
            state: model.state.into(),
            error_reason: model.error_reason,
            version: model.version,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

/// Input for inserting a transaction row.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Account the transaction applies to.
    pub account_id: AccountId,
    /// Amount moved.
    pub money: Money,
    /// Debit or credit.
    pub direction: Direction,
    /// Free-text annotation.
    pub memo: Option<String>,
    /// Initial state.
    pub state: TransactionState,
    /// Failure reason, for rows inserted FAILED.
    pub error_reason: Option<String>,
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a transaction row inside the caller's unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(
        &self,
        txn: &DatabaseTransaction,
        input: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let now = Utc::now().into();
        let model = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            account_id: Set(input.account_id.into_inner()),
            money: Set(encode_money(&input.money)?),
            direction: Set(input.direction.into()),
            memo: Set(input.memo),
            state: Set(input.state.into()),
            error_reason: Set(input.error_reason),
            version: Set(INITIAL_VERSION),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = model.insert(txn).await.map_err(db_error)?;
        Transaction::try_from(model)
    }

    /// Finds a transaction without locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored money is corrupt.
    pub async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, LedgerError> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(Transaction::try_from)
            .transpose()
    }

    /// Reads a transaction with `SELECT ... FOR UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if the row does not exist, or
    /// `LockTimeout` if the lock wait exceeds `lock_timeout`.
    pub async fn find_for_update(
        &self,
        txn: &DatabaseTransaction,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        transactions::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::TransactionNotFound(id))
            .and_then(Transaction::try_from)
    }

    /// Writes a new state and direction, bumping `version`.
    ///
    /// The update only matches the row at `current.version`, so a write made
    /// since the locked read is detected instead of overwritten.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the version moved.
    pub async fn update_state(
        &self,
        txn: &DatabaseTransaction,
        current: &Transaction,
        direction: Direction,
        state: TransactionState,
    ) -> Result<Transaction, LedgerError> {
        let now = Utc::now();
        let next_version = current.version + 1;

        let result = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Direction,
                Expr::value(TransactionDirection::from(direction)),
            )
            .col_expr(
                transactions::Column::State,
                Expr::value(StoredState::from(state)),
            )
            .col_expr(transactions::Column::Version, Expr::value(next_version))
            .col_expr(
                transactions::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<FixedOffset>::from(now)),
            )
            .filter(transactions::Column::Id.eq(current.id.into_inner()))
            .filter(transactions::Column::Version.eq(current.version))
            .exec(txn)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 0 {
            tracing::warn!(
                transaction_id = %current.id,
                version = current.version,
                "Transaction version moved under lock"
            );
            return Err(LedgerError::ConcurrentModification);
        }

        Ok(Transaction {
            direction,
            state,
            version: next_version,
            updated_at: now,
            ..current.clone()
        })
    }

    /// Lists an account's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}
