//! Idempotency lease stores.
//!
//! - `MemoryLeaseStore` keeps leases in process with moka. Suitable for a
//!   single node.
//! - `RedisLeaseStore` keeps leases in Redis so every node sees them.
//!
//! Both implement `try_acquire` as a conditional write.

pub mod memory;
pub mod redis_store;

pub use memory::MemoryLeaseStore;
pub use redis_store::RedisLeaseStore;
