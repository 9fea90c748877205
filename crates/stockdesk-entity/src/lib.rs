//! # stockdesk-entity
//!
//! Domain entity models for StockDesk.
//!
//! Account-level records (users, companies, refresh sessions) are plain
//! table rows and derive `sqlx::FromRow`. Everything a company owns is a
//! tenant-scoped document implementing [`TenantEntity`]; those are only
//! ever read or written through the tenant-guarded repository.

pub mod company;
pub mod integration;
pub mod inventory;
pub mod role;
pub mod session;
pub mod tenant;
pub mod user;

pub use tenant::{TENANT_FIELD, TenantEntity};
