//! Account repository for balance reads and writes.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, sea_query::Expr,
};

use bledger_core::ledger::{Account, CreateAccountRequest, LedgerError};
use bledger_shared::types::{AccountId, Currency, Money};

use crate::entities::accounts;
use crate::error::db_error;

/// Decodes a stored money blob.
pub(crate) fn decode_money(value: &serde_json::Value) -> Result<Money, LedgerError> {
    serde_json::from_value(value.clone()).map_err(|e| LedgerError::CorruptMoney(e.to_string()))
}

/// Encodes money for storage.
pub(crate) fn encode_money(money: &Money) -> Result<serde_json::Value, LedgerError> {
    serde_json::to_value(money).map_err(|e| LedgerError::CorruptMoney(e.to_string()))
}

impl TryFrom<accounts::Model> for Account {
    type Error = LedgerError;

    fn try_from(model: accounts::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AccountId::from_uuid(model.id),
            balance: decode_money(&model.balance)?,
            name: model.name,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens an account with a zero balance in the default currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateAccountRequest) -> Result<Account, LedgerError> {
        let now = Utc::now().into();
        let model = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            name: Set(input.name),
            description: Set(input.description),
            balance: Set(encode_money(&Money::zero(Currency::usd()))?),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = model.insert(&self.db).await.map_err(db_error)?;
        Account::try_from(model)
    }

    /// Finds an account without locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored balance is corrupt.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(Account::try_from)
            .transpose()
    }

    /// Reads an account with `SELECT ... FOR UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the row does not exist, or `LockTimeout`
    /// if the lock wait exceeds the unit of work's `lock_timeout`.
    pub async fn find_for_update(
        &self,
        txn: &DatabaseTransaction,
        id: AccountId,
    ) -> Result<Account, LedgerError> {
        accounts::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(db_error)?
            .ok_or(LedgerError::AccountNotFound(id))
            .and_then(Account::try_from)
    }

    /// Writes a new balance.
    ///
    /// The caller must hold the row lock from `find_for_update`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or the row is gone.
    pub async fn update_balance(
        &self,
        txn: &DatabaseTransaction,
        id: AccountId,
        balance: &Money,
    ) -> Result<(), LedgerError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(encode_money(balance)?))
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec(txn)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::AccountNotFound(id));
        }
        Ok(())
    }
}
