//! HTTP-level integration tests, run against the in-memory backends.

mod auth_test;
mod helpers;
mod tenant_isolation_test;
