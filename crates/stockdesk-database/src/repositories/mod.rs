//! Typed repositories over the storage traits.

pub mod tenant;

pub use tenant::TenantRepository;
