//! Google Sheets `values.get` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use stockdesk_core::config::GoogleSheetsConfig;
use stockdesk_core::error::{AppError, ErrorKind};
use stockdesk_core::result::AppResult;
use stockdesk_entity::integration::{IntegrationSecret, IntegrationSettings};

use super::SheetSource;

/// Reads ranges with a company's OAuth access token.
#[derive(Debug, Clone)]
pub struct GoogleSheetsSource {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleSheetsSource {
    /// Create a client from configuration.
    pub fn new(config: &GoogleSheetsConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsSource {
    async fn fetch_rows(
        &self,
        settings: &IntegrationSettings,
        secret: &IntegrationSecret,
    ) -> AppResult<Vec<Vec<String>>> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, settings.spreadsheet_id, settings.range
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&secret.access_token)
            .send()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ExternalService, "Sheets request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(format!(
                "Sheets request failed with status {status}: {text}"
            )));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ExternalService, "Sheets response was not a value range", e))?;

        debug!(rows = range.values.len(), spreadsheet = %settings.spreadsheet_id, "Fetched sheet rows");
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
