//! Scheduled job implementations.

pub mod sheet_sync;
