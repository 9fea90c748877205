//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler starts with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression for the sheet sync job.
    #[serde(default = "default_sheet_sync_cron")]
    pub sheet_sync_cron: String,
    /// Lease lifetime for the sheet sync job in seconds. A crashed holder
    /// stops blocking other workers once it elapses.
    #[serde(default = "default_lease_ttl")]
    pub sheet_sync_lease_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sheet_sync_cron: default_sheet_sync_cron(),
            sheet_sync_lease_seconds: default_lease_ttl(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sheet_sync_cron() -> String {
    "0 */15 * * * *".to_string()
}

fn default_lease_ttl() -> u64 {
    600
}
