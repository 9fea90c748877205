//! Marker trait for records that belong to exactly one company.

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Name of the tenant identifier field carried by every tenant-scoped document.
pub const TENANT_FIELD: &str = "company_id";

/// A persisted record owned by one company.
///
/// Implementors serialize to a JSON object with top-level `id` and
/// `company_id` fields.
pub trait TenantEntity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection (logical table) name.
    const COLLECTION: &'static str;

    /// Whether records are immutable once inserted.
    const APPEND_ONLY: bool = false;

    /// Record identifier.
    fn id(&self) -> Uuid;

    /// Owning company.
    fn company_id(&self) -> Uuid;
}

/// Implements [`TenantEntity`] for a struct with `id` and `company_id` fields.
#[macro_export]
macro_rules! tenant_entity {
    ($ty:ty, $collection:literal $(, append_only = $append_only:literal)?) => {
        impl $crate::tenant::TenantEntity for $ty {
            const COLLECTION: &'static str = $collection;
            const APPEND_ONLY: bool = false $(|| $append_only)?;

            fn id(&self) -> uuid::Uuid {
                self.id
            }

            fn company_id(&self) -> uuid::Uuid {
                self.company_id
            }
        }
    };
}
