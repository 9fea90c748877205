//! Role-based authorization within a tenant.

pub mod evaluator;

pub use evaluator::PermissionEvaluator;
