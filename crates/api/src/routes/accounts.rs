//! Account routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    routing::{get, post},
};
use serde::Deserialize;
use validator::Validate;

use bledger_core::ledger::{Account, CreateAccountRequest, Transaction};
use bledger_shared::types::AccountId;

use crate::AppState;
use crate::error::ApiResult;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}/transactions", get(list_transactions))
}

/// Request body for opening an account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountBody {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Description.
    #[serde(default)]
    #[validate(length(max = 4096))]
    pub description: String,
}

/// POST /accounts
async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountBody>, JsonRejection>,
) -> ApiResult<Json<Account>> {
    let Json(body) = payload?;
    body.validate()?;

    let account = state
        .engine
        .create_account(CreateAccountRequest {
            name: body.name,
            description: body.description,
        })
        .await?;
    Ok(Json(account))
}

/// GET /accounts/{id}
async fn get_account(
    State(state): State<AppState>,
    id: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Json<Account>> {
    let Path(id) = id?;
    Ok(Json(state.engine.get_account(id).await?))
}

/// GET /accounts/{id}/transactions
async fn list_transactions(
    State(state): State<AppState>,
    id: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let Path(id) = id?;
    Ok(Json(state.engine.list_account_transactions(id).await?))
}
