//! Company (tenant) entities.

pub mod invite;
pub mod model;

pub use invite::Invite;
pub use model::{Company, CreateCompany};
