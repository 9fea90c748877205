//! Stock location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A store, warehouse, or other place where stock is held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Location identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Display name.
    pub name: String,
    /// Short code, unique per company.
    pub code: String,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// Whether stock can still be moved in or out.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

crate::tenant_entity!(Location, "locations");
