//! # stockdesk-cache
//!
//! Cache provider implementations for StockDesk:
//!
//! - **memory**: in-process cache using [moka](https://crates.io/crates/moka)
//!   with per-entry TTLs
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime from configuration. [`LeaseLock`]
//! builds a TTL-bounded mutual-exclusion lease on top of either provider.

pub mod keys;
pub mod lock;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use lock::{Lease, LeaseLock};
pub use provider::CacheManager;
