//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/v1`
//! - Idempotency middleware for transaction creation
//! - Error to response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use bledger_core::idempotency::IdempotencyCoordinator;
use bledger_db::LedgerEngine;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ledger engine.
    pub engine: Arc<LedgerEngine>,
    /// Idempotency coordinator for mutating requests.
    pub idempotency: Arc<IdempotencyCoordinator>,
    /// Header carrying the idempotency key.
    pub idempotency_header: String,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
