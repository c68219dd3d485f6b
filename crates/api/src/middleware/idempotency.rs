//! Idempotency middleware for transaction creation.

use axum::{
    body::{Body, to_bytes},
    extract::{OptionalFromRequestParts, OriginalUri, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use bledger_core::idempotency::{Fingerprint, IdempotencyError};
use bledger_core::ledger::TransactionRequest;
use bledger_shared::AppError;

use crate::AppState;
use crate::error::ApiError;

/// Largest request body buffered for fingerprinting.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Admits a transaction-creating request through the idempotency coordinator.
///
/// This middleware:
/// 1. Lets allow-listed methods and paths through untouched
/// 2. Requires the idempotency header
/// 3. Buffers and parses the body, then asks the coordinator for a lease
/// 4. Stores the fingerprint in request extensions and restores the body
pub async fn idempotency_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path().to_string(), |uri| uri.path().to_string());

    if state
        .idempotency
        .policy()
        .is_whitelisted(request.method().as_str(), &path)
    {
        return Ok(next.run(request).await);
    }

    let key = request
        .headers()
        .get(state.idempotency_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .ok_or(IdempotencyError::MissingKey)?;

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read request body: {e}")))?;
    let transaction: TransactionRequest = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::Validation(format!("Invalid transaction request: {e}")))?;

    let fingerprint = state.idempotency.admit(Some(&key), &transaction).await?;

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(IdempotencyKey(fingerprint));
    Ok(next.run(request).await)
}

/// Fingerprint admitted by the idempotency middleware.
///
/// Absent when the middleware let an allow-listed request through; extract
/// it as `Option<IdempotencyKey>` on routes that can be allow-listed.
#[derive(Debug, Clone)]
pub struct IdempotencyKey(pub Fingerprint);

impl<S> OptionalFromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned())
    }
}
