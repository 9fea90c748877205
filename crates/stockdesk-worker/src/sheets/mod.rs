//! Reading POS summary rows from spreadsheets.

pub mod google;
pub mod row;

use async_trait::async_trait;

use stockdesk_core::result::AppResult;
use stockdesk_entity::integration::{IntegrationSecret, IntegrationSettings};

pub use google::GoogleSheetsSource;
pub use row::{SalesRow, parse_rows};

/// Fetches the raw cell values of a configured range.
#[async_trait]
pub trait SheetSource: Send + Sync + std::fmt::Debug + 'static {
    /// Rows of the range named by `settings`, each a list of cell strings.
    async fn fetch_rows(
        &self,
        settings: &IntegrationSettings,
        secret: &IntegrationSecret,
    ) -> AppResult<Vec<Vec<String>>>;
}
