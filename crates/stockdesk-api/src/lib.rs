//! # stockdesk-api
//!
//! HTTP API layer for StockDesk built on Axum.
//!
//! Provides the REST endpoints, the bearer and refresh-cookie plumbing,
//! middleware (request logging, CORS), extractors, DTOs, and the mapping
//! from [`stockdesk_core::AppError`] to HTTP responses.

pub mod app;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use error::ApiError;
pub use state::AppState;
