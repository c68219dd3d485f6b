//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod accounts;
pub mod health;
pub mod transactions;

/// Creates the versioned API router.
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(accounts::routes())
        .merge(transactions::routes(state))
}
