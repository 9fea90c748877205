//! Integration records: sheet settings, provider secrets, imports, and
//! the POS summaries they produce.

pub mod import_job;
pub mod pos_summary;
pub mod secret;
pub mod settings;

pub use import_job::{ImportJob, ImportSource, ImportStatus};
pub use pos_summary::PosSummary;
pub use secret::IntegrationSecret;
pub use settings::IntegrationSettings;

/// Provider key for Google Sheets.
pub const GOOGLE_SHEETS: &str = "google_sheets";
