//! Refresh session entities.

pub mod model;

pub use model::{NewRefreshSession, RefreshSession};
