//! Catalogue item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stock-keeping unit sold or stocked by a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Stock-keeping unit code, unique per company.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Unit of measure (`each`, `kg`, ...).
    pub unit: String,
    /// Sale price in minor currency units.
    pub price_cents: i64,
    /// Stock level at which the item should be reordered.
    #[serde(default)]
    pub reorder_level: i64,
    /// Inactive items are hidden from POS imports.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

crate::tenant_entity!(Item, "items");
