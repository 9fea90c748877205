//! Third-party integration configuration.

use serde::{Deserialize, Serialize};

/// Integration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Google Sheets client settings.
    #[serde(default)]
    pub google_sheets: GoogleSheetsConfig,
}

/// Google Sheets values API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSheetsConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for GoogleSheetsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

fn default_timeout() -> u64 {
    20
}
