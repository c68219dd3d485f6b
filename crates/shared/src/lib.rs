//! Shared types, errors, and configuration for bledger.
//!
//! This crate provides common types used across all other crates:
//! - Money types with an integer minor-unit amount and a currency code
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, IdempotencyConfig, PendingSettlement};
pub use error::{AppError, AppResult};
