//! Daily POS sales summary rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Units sold and gross takings for one SKU on one business day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosSummary {
    /// Row identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Trading day.
    pub business_date: NaiveDate,
    /// Item SKU as reported by the POS.
    pub sku: String,
    /// Units sold.
    pub quantity: i64,
    /// Gross takings in minor currency units.
    pub gross_cents: i64,
    /// Import that produced the row.
    pub import_job_id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

crate::tenant_entity!(PosSummary, "pos_summaries");
