//! Transaction routes.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/transactions` | create pending |
//! | POST | `/transactions/immediate` | create and clear (201) |
//! | GET | `/transactions/{id}` | get |
//! | PUT | `/transactions/{id}` | execute pending |
//! | DELETE | `/transactions/{id}` | reverse |
//!
//! The two POST routes sit behind the idempotency middleware. PUT and DELETE
//! carry no body to fingerprint and are not guarded.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tracing::info;

use bledger_core::ledger::{Transaction, TransactionRequest};
use bledger_shared::types::TransactionId;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::{IdempotencyKey, idempotency_middleware};

/// Creates the transaction routes.
pub fn routes(state: AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/transactions", post(create_pending_transaction))
        .route("/transactions/immediate", post(create_transaction))
        .route_layer(middleware::from_fn_with_state(state, idempotency_middleware));

    Router::new()
        .route(
            "/transactions/{id}",
            get(get_transaction)
                .put(execute_transaction)
                .delete(reverse_transaction),
        )
        .merge(guarded)
}

/// POST /transactions
async fn create_pending_transaction(
    State(state): State<AppState>,
    key: Option<IdempotencyKey>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> ApiResult<Json<Transaction>> {
    let Json(request) = payload?;
    info!(idempotency_key = key_field(key.as_ref()), "Creating pending transaction");

    Ok(Json(state.engine.create_pending_transaction(request).await?))
}

/// POST /transactions/immediate
async fn create_transaction(
    State(state): State<AppState>,
    key: Option<IdempotencyKey>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let Json(request) = payload?;
    info!(idempotency_key = key_field(key.as_ref()), "Creating immediate transaction");

    let transaction = state.engine.create_transaction(request).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Log value for an admitted key; allow-listed requests carry none.
fn key_field(key: Option<&IdempotencyKey>) -> &str {
    key.map_or("allow-listed", |IdempotencyKey(fp)| fp.as_str())
}

/// GET /transactions/{id}
async fn get_transaction(
    State(state): State<AppState>,
    id: Result<Path<TransactionId>, PathRejection>,
) -> ApiResult<Json<Transaction>> {
    let Path(id) = id?;
    Ok(Json(state.engine.get_transaction(id).await?))
}

/// PUT /transactions/{id}
async fn execute_transaction(
    State(state): State<AppState>,
    id: Result<Path<TransactionId>, PathRejection>,
) -> ApiResult<Json<Transaction>> {
    let Path(id) = id?;
    Ok(Json(state.engine.execute_pending_transaction(id).await?))
}

/// DELETE /transactions/{id}
async fn reverse_transaction(
    State(state): State<AppState>,
    id: Result<Path<TransactionId>, PathRejection>,
) -> ApiResult<Json<Transaction>> {
    let Path(id) = id?;
    Ok(Json(state.engine.reverse_transaction(id).await?))
}
