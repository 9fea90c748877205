//! Tenant isolation.
//!
//! [`TenantContext`] is created per request (or per background-job
//! iteration) and passed explicitly down to data access. [`TenantGuard`]
//! turns a context plus an unscoped filter, pipeline, document, or patch
//! into a scoped value that names exactly one company.

pub mod context;
pub mod guard;

pub use context::TenantContext;
pub use guard::{ScopedDelete, ScopedDocument, ScopedFilter, ScopedPipeline, ScopedUpdate, TenantGuard};
