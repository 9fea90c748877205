//! Per-company integration settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where to read POS summary rows from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationSettings {
    /// Settings identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Provider key, e.g. `google_sheets`.
    pub provider: String,
    /// Spreadsheet identifier.
    pub spreadsheet_id: String,
    /// A1 range holding the rows (`Sales!A2:E`).
    pub range: String,
    /// Location that imported sales are booked against.
    pub location_id: Uuid,
    /// Whether the scheduled sync includes this company.
    pub enabled: bool,
    /// Last successful sync.
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

crate::tenant_entity!(IntegrationSettings, "integration_settings");
