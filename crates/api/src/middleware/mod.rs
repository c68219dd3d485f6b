//! Request middleware.

pub mod idempotency;

pub use idempotency::{IdempotencyKey, idempotency_middleware};
