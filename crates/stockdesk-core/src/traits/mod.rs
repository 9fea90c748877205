//! Traits defined in `stockdesk-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
