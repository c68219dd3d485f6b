//! bledger API Server
//!
//! Main entry point for the ledger service.

use std::sync::Arc;
use std::time::Duration;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bledger_api::{AppState, create_router};
use bledger_cache::{MemoryLeaseStore, RedisLeaseStore};
use bledger_core::idempotency::{IdempotencyCoordinator, IdempotencyPolicy, LeaseStore};
use bledger_db::{LedgerEngine, connect, migration::Migrator};
use bledger_shared::AppConfig;
use bledger_shared::config::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bledger=debug,tower_http=debug".into());
    match config.log.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    if config.database.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    // Pick the lease store
    let store: Arc<dyn LeaseStore> = match config.cache.url.as_deref() {
        Some(url) => {
            let store = RedisLeaseStore::connect(url).await?;
            info!("Using Redis lease store");
            Arc::new(store)
        }
        None => {
            info!(
                max_leases = config.idempotency.max_leases,
                "Using in-process lease store"
            );
            Arc::new(MemoryLeaseStore::with_capacity(config.idempotency.max_leases))
        }
    };

    let engine = LedgerEngine::new(db)
        .with_lock_timeout(Duration::from_millis(config.database.lock_timeout_ms))
        .with_settlement(config.ledger.pending_settlement);

    // Create application state
    let state = AppState {
        engine: Arc::new(engine),
        idempotency: Arc::new(IdempotencyCoordinator::new(
            store,
            IdempotencyPolicy::from_config(&config.idempotency),
        )),
        idempotency_header: config.idempotency.header.clone(),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
