//! Company roles and their per-module permissions.

pub mod model;
pub mod permission;

pub use model::Role;
pub use permission::{Action, Module, ModuleAccess};
