//! Ledger schema: accounts and their single-leg transactions.
//!
//! Money values are JSONB blobs `{"amount", "currency"}` decoded by the
//! repositories.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS transactions CASCADE;")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS accounts CASCADE;")
            .await?;
        Ok(())
    }
}

const LEDGER_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    balance JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_balance_shape CHECK (
        balance ? 'amount' AND balance ? 'currency'
        AND (balance->>'amount')::NUMERIC >= 0
    )
);

CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id),
    money JSONB NOT NULL,
    direction VARCHAR(16) NOT NULL,
    memo TEXT,
    state VARCHAR(16) NOT NULL,
    error_reason TEXT,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_direction CHECK (direction IN ('DEBIT', 'CREDIT')),
    CONSTRAINT chk_state CHECK (state IN ('PENDING', 'COMPLETED', 'FAILED', 'REVERSED')),
    CONSTRAINT chk_error_reason CHECK ((state = 'FAILED') = (error_reason IS NOT NULL)),
    CONSTRAINT chk_version CHECK (version >= 1)
);

CREATE INDEX idx_transactions_account_created ON transactions(account_id, created_at DESC);
";
