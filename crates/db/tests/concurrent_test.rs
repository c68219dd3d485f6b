//! Concurrent access tests against Postgres.
//!
//! These run only when `DATABASE_URL` points at a Postgres database; the
//! schema is brought up with the crate's migrator.
//!
//! They verify that:
//! - Concurrent debits on one account never overdraw it or lose updates
//! - A held row lock makes a second writer fail with `LockTimeout`

use futures::future::join_all;
use sea_orm::{Database, DatabaseConnection, EntityTrait, QuerySelect, TransactionTrait};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

use bledger_core::ledger::{CreateAccountRequest, Direction, LedgerError, TransactionRequest};
use bledger_db::LedgerEngine;
use bledger_db::entities::accounts;
use bledger_db::migration::Migrator;
use bledger_shared::types::{AccountId, Currency, Money};

/// Concurrent debits of 10 against a balance of 500.
const TASKS: usize = 100;

async fn postgres() -> Option<DatabaseConnection> {
    let url = env::var("DATABASE_URL").ok()?;
    let db = Database::connect(url).await.ok()?;
    Migrator::up(&db, None).await.ok()?;
    Some(db)
}

fn request(account_id: AccountId, amount: u64, direction: Direction) -> TransactionRequest {
    TransactionRequest {
        money: Money::new(amount, Currency::usd()),
        memo: None,
        direction,
        account_id,
    }
}

async fn funded_account(engine: &LedgerEngine, amount: u64) -> AccountId {
    let id = engine
        .create_account(CreateAccountRequest {
            name: "Concurrent".to_string(),
            description: String::new(),
        })
        .await
        .unwrap()
        .id;
    engine
        .create_transaction(request(id, amount, Direction::Credit))
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn test_concurrent_debits_never_overdraw() {
    let Some(db) = postgres().await else {
        return;
    };
    let engine = Arc::new(LedgerEngine::new(db));
    let id = funded_account(&engine, 500).await;

    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|_| {
        let engine = Arc::clone(&engine);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            engine.create_transaction(request(id, 10, Direction::Debit)).await
        })
    });

    let results = join_all(handles).await;
    let mut succeeded = 0u64;
    for result in results {
        match result.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 50);
    let account = engine.get_account(id).await.unwrap();
    assert_eq!(account.balance.amount, 0);
}

#[tokio::test]
async fn test_concurrent_mixed_writes_keep_balance_exact() {
    let Some(db) = postgres().await else {
        return;
    };
    let engine = Arc::new(LedgerEngine::new(db));
    let id = funded_account(&engine, 1_000).await;

    let handles = (0..40u64).map(|i| {
        let engine = Arc::clone(&engine);
        let direction = if i % 2 == 0 { Direction::Credit } else { Direction::Debit };
        tokio::spawn(async move {
            engine
                .create_transaction(request(id, 1 + i, direction))
                .await
        })
    });
    for result in join_all(handles).await {
        result.unwrap().unwrap();
    }

    let credits: u64 = (0..40u64).filter(|i| i % 2 == 0).map(|i| 1 + i).sum();
    let debits: u64 = (0..40u64).filter(|i| i % 2 == 1).map(|i| 1 + i).sum();
    let account = engine.get_account(id).await.unwrap();
    assert_eq!(account.balance.amount, 1_000 + credits - debits);
}

#[tokio::test]
async fn test_held_lock_times_out() {
    let Some(db) = postgres().await else {
        return;
    };
    let engine = LedgerEngine::new(db.clone()).with_lock_timeout(Duration::from_millis(100));
    let id = funded_account(&engine, 100).await;

    let holder = db.begin().await.unwrap();
    accounts::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(&holder)
        .await
        .unwrap();

    let err = engine
        .create_transaction(request(id, 10, Direction::Debit))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::LockTimeout));
    assert!(err.is_retryable());

    holder.rollback().await.unwrap();
    engine
        .create_transaction(request(id, 10, Direction::Debit))
        .await
        .unwrap();
}
