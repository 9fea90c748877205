//! # stockdesk-core
//!
//! Core crate for StockDesk. Holds the configuration schemas, typed
//! identifiers, query building blocks (filters, sorting, pagination),
//! the cache provider trait, and the unified error system.
//!
//! This crate has **no** dependencies on other StockDesk crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
