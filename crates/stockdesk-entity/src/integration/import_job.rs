//! Import job bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where imported rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSource {
    /// Scheduled Google Sheets sync.
    GoogleSheets,
    /// Uploaded POS CSV.
    PosCsv,
}

/// Import progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    /// Rows are being read.
    Running,
    /// All rows processed.
    Completed,
    /// The import stopped with an error.
    Failed,
}

/// One run of an import for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    /// Job identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Row source.
    pub source: ImportSource,
    /// Current status.
    pub status: ImportStatus,
    /// Rows read from the source.
    #[serde(default)]
    pub rows_seen: i64,
    /// Rows that produced a summary.
    #[serde(default)]
    pub rows_imported: i64,
    /// Failure description.
    #[serde(default)]
    pub error: Option<String>,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// Completion time.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

crate::tenant_entity!(ImportJob, "import_jobs");
