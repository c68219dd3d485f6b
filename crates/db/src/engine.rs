//! Ledger engine: runs each ledger operation as one unit of work.
//!
//! Row locks are taken with `find_for_update` and held until commit or
//! rollback. Where both rows are locked the transaction row is always locked
//! before the account row. A failure after the first lock rolls back the
//! balance write and the state write together.

use std::time::Duration;

use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, TransactionTrait,
};
use tracing::instrument;

use bledger_core::ledger::{
    Account, CreateAccountRequest, LedgerError, LedgerService, PendingOutcome, Transaction,
    TransactionRequest, TransactionState,
};
use bledger_shared::PendingSettlement;
use bledger_shared::types::{AccountId, TransactionId};

use crate::error::db_error;
use crate::repositories::{AccountRepository, NewTransaction, TransactionRepository};

/// Default bound on row lock waits.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Orchestrates ledger operations against the database.
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    db: DatabaseConnection,
    accounts: AccountRepository,
    transactions: TransactionRepository,
    lock_timeout: Duration,
    settlement: PendingSettlement,
}

impl LedgerEngine {
    /// Creates an engine with the default lock timeout and settlement.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone()),
            transactions: TransactionRepository::new(db.clone()),
            db,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            settlement: PendingSettlement::default(),
        }
    }

    /// Sets the bound on row lock waits.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Sets how executing a pending transaction treats the balance.
    #[must_use]
    pub const fn with_settlement(mut self, settlement: PendingSettlement) -> Self {
        self.settlement = settlement;
        self
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Opens an account with a zero USD balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_account(
        &self,
        request: CreateAccountRequest,
    ) -> Result<Account, LedgerError> {
        let account = self.accounts.create(request).await?;
        tracing::info!(account_id = %account.id, "Account created");
        Ok(account)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Looks up an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it does not exist.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Looks up a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if it does not exist.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.transactions
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// Lists an account's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn list_account_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.get_account(account_id).await?;
        self.transactions.list_for_account(account_id).await
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Creates a transaction on the pending path.
    ///
    /// A valid request adjusts the balance now and is stored PENDING. A
    /// currency mismatch or insufficient funds is stored FAILED with the
    /// balance untouched; both are returned as `Ok`.
    ///
    /// # Errors
    ///
    /// - `ZeroAmount` before anything is written
    /// - `AccountNotFound`, `BalanceOverflow`, `LockTimeout`, `Database`
    #[instrument(
        skip(self, request),
        fields(
            account_id = %request.account_id,
            direction = %request.direction,
            amount = request.money.amount,
        )
    )]
    pub async fn create_pending_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        LedgerService::validate_request(&request)?;

        let txn = self.begin().await?;
        let result = self.open_pending(&txn, request).await;
        let transaction = Self::finish(txn, result).await?;

        match transaction.state {
            TransactionState::Failed => tracing::warn!(
                transaction_id = %transaction.id,
                reason = transaction.error_reason.as_deref().unwrap_or_default(),
                "Pending transaction recorded as failed"
            ),
            _ => tracing::info!(transaction_id = %transaction.id, "Pending transaction created"),
        }
        Ok(transaction)
    }

    /// Executes a pending transaction.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound`, `AccountNotFound`
    /// - `InvalidStateTransition` unless PENDING
    /// - balance errors when the delta is re-applied
    #[instrument(skip(self), fields(settlement = ?self.settlement))]
    pub async fn execute_pending_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let txn = self.begin().await?;
        let result = self.execute(&txn, id).await;
        let transaction = Self::finish(txn, result).await?;

        tracing::info!(transaction_id = %transaction.id, "Pending transaction executed");
        Ok(transaction)
    }

    /// Creates and clears a transaction in one unit of work.
    ///
    /// Unlike the pending path, any failure aborts creation and no row is
    /// kept.
    ///
    /// # Errors
    ///
    /// - `ZeroAmount`, `AccountNotFound`
    /// - `CurrencyMismatch`, `InsufficientFunds`, `BalanceOverflow`
    #[instrument(
        skip(self, request),
        fields(
            account_id = %request.account_id,
            direction = %request.direction,
            amount = request.money.amount,
        )
    )]
    pub async fn create_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        LedgerService::validate_request(&request)?;

        let txn = self.begin().await?;
        let result = self.clear_immediately(&txn, request).await;
        let transaction = Self::finish(txn, result).await?;

        tracing::info!(transaction_id = %transaction.id, "Transaction completed");
        Ok(transaction)
    }

    /// Reverses a completed transaction.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound`, `AccountNotFound`
    /// - `InvalidStateTransition` unless COMPLETED
    /// - `InsufficientFunds` when undoing a credit that was spent
    #[instrument(skip(self))]
    pub async fn reverse_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        let txn = self.begin().await?;
        let result = self.reverse(&txn, id).await;
        let transaction = Self::finish(txn, result).await?;

        tracing::info!(
            transaction_id = %transaction.id,
            direction = %transaction.direction,
            "Transaction reversed"
        );
        Ok(transaction)
    }

    // ========================================================================
    // Units of work
    // ========================================================================

    async fn open_pending(
        &self,
        txn: &DatabaseTransaction,
        request: TransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        let account = self.accounts.find_for_update(txn, request.account_id).await?;

        let (state, error_reason) = match LedgerService::open_pending(&account.balance, &request)? {
            PendingOutcome::Reserved { new_balance } => {
                self.accounts
                    .update_balance(txn, account.id, &new_balance)
                    .await?;
                (TransactionState::Pending, None)
            }
            PendingOutcome::Failed { reason } => (TransactionState::Failed, Some(reason.to_string())),
        };

        self.transactions
            .insert(
                txn,
                NewTransaction {
                    account_id: account.id,
                    money: request.money,
                    direction: request.direction,
                    memo: request.memo,
                    state,
                    error_reason,
                },
            )
            .await
    }

    async fn execute(
        &self,
        txn: &DatabaseTransaction,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self.transactions.find_for_update(txn, id).await?;
        let account = self
            .accounts
            .find_for_update(txn, transaction.account_id)
            .await?;

        let transition = LedgerService::execute(
            transaction.state,
            &account.balance,
            &transaction.money,
            transaction.direction,
            self.settlement,
        )?;

        if transition.new_balance != account.balance {
            self.accounts
                .update_balance(txn, account.id, &transition.new_balance)
                .await?;
        }
        self.transactions
            .update_state(txn, &transaction, transition.direction, transition.new_state)
            .await
    }

    async fn clear_immediately(
        &self,
        txn: &DatabaseTransaction,
        request: TransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        let account = self.accounts.find_for_update(txn, request.account_id).await?;
        let transition = LedgerService::clear(&account.balance, &request)?;

        let pending = self
            .transactions
            .insert(
                txn,
                NewTransaction {
                    account_id: account.id,
                    money: request.money,
                    direction: request.direction,
                    memo: request.memo,
                    state: TransactionState::Pending,
                    error_reason: None,
                },
            )
            .await?;

        self.accounts
            .update_balance(txn, account.id, &transition.new_balance)
            .await?;
        self.transactions
            .update_state(txn, &pending, transition.direction, transition.new_state)
            .await
    }

    async fn reverse(
        &self,
        txn: &DatabaseTransaction,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self.transactions.find_for_update(txn, id).await?;
        let account = self
            .accounts
            .find_for_update(txn, transaction.account_id)
            .await?;

        let transition = LedgerService::reverse(
            transaction.state,
            &account.balance,
            &transaction.money,
            transaction.direction,
        )?;

        self.accounts
            .update_balance(txn, account.id, &transition.new_balance)
            .await?;
        self.transactions
            .update_state(txn, &transaction, transition.direction, transition.new_state)
            .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Begins a unit of work with a bounded lock wait.
    async fn begin(&self) -> Result<DatabaseTransaction, LedgerError> {
        let txn = self.db.begin().await.map_err(db_error)?;
        if txn.get_database_backend() == DatabaseBackend::Postgres {
            let sql = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout.as_millis());
            txn.execute_unprepared(&sql).await.map_err(db_error)?;
        }
        Ok(txn)
    }

    /// Commits on success and rolls back on failure.
    async fn finish<T>(
        txn: DatabaseTransaction,
        result: Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        match result {
            Ok(value) => {
                txn.commit().await.map_err(db_error)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::error!(error = %rollback, "Rollback failed");
                }
                tracing::debug!(error = %err, code = err.error_code(), "Unit of work rolled back");
                Err(err)
            }
        }
    }
}
