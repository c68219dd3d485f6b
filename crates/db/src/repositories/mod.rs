//! Repository abstractions for data access.
//!
//! Methods that take a `DatabaseTransaction` run inside the caller's unit of
//! work; `find_for_update` takes an exclusive row lock held until it ends.

pub mod account;
pub mod transaction;

pub use account::AccountRepository;
pub use transaction::{NewTransaction, TransactionRepository};
