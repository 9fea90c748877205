//! Core type definitions shared across the StockDesk workspace.

pub mod filter;
pub mod id;
pub mod pagination;
pub mod sorting;

pub use filter::{Filter, FilterField, FilterOp, FilterValue};
pub use id::*;
pub use pagination::{PageRequest, PageResponse};
pub use sorting::{SortDirection, SortField};
