//! # stockdesk-database
//!
//! Persistence for StockDesk.
//!
//! - [`tenant`]: the request tenant context and the Tenant Scope Guard.
//!   Storage only accepts the scoped query types the guard produces, so
//!   no operation on a tenant-owned collection can run unscoped.
//! - [`store`]: storage traits with PostgreSQL and in-memory backends.
//! - [`repositories`]: [`TenantRepository`], the typed entry point for
//!   every tenant-scoped entity.
//! - [`query`]: aggregation pipelines and the in-process evaluator.

pub mod connection;
pub mod migration;
pub mod query;
pub mod repositories;
pub mod store;
pub mod tenant;

pub use connection::DatabasePool;
pub use repositories::TenantRepository;
pub use store::{AccountStore, RecordStore, RefreshSessionStore, Stores};
pub use tenant::{TenantContext, TenantGuard};
