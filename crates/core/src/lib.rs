//! Core business logic for bledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `ledger` - Single-leg transaction state machine and balance mutation
//! - `idempotency` - Request fingerprints, leases and admission

pub mod idempotency;
pub mod ledger;
