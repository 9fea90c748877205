//! Google Sheets integration settings and import history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use stockdesk_auth::PermissionEvaluator;
use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{Filter, PageRequest, PageResponse, SortField};
use stockdesk_database::{RecordStore, TenantContext, TenantRepository};
use stockdesk_entity::integration::{GOOGLE_SHEETS, ImportJob, IntegrationSecret, IntegrationSettings};
use stockdesk_entity::inventory::Location;
use stockdesk_entity::role::{Action, Module};

use crate::context::RequestContext;
use crate::validation::validate_input;

/// Request to configure the sheet sync.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SheetsSettingsInput {
    /// Spreadsheet identifier.
    #[validate(length(min = 1, max = 200, message = "is required"))]
    pub spreadsheet_id: String,
    /// A1 range holding the rows.
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub range: String,
    /// Location imported sales are booked against.
    pub location_id: Uuid,
    /// Include the company in the scheduled sync.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Replacement provider token. Never returned.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub access_token: Option<String>,
    /// Expiry of `access_token`.
    pub token_expires_at: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

/// Sheet settings as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SheetsSettingsView {
    /// Stored settings, if configured.
    pub settings: Option<IntegrationSettings>,
    /// Whether a provider token is on file.
    pub has_access_token: bool,
}

/// Reads and writes integration settings.
#[derive(Debug, Clone)]
pub struct IntegrationService {
    settings: TenantRepository<IntegrationSettings>,
    secrets: TenantRepository<IntegrationSecret>,
    jobs: TenantRepository<ImportJob>,
    locations: TenantRepository<Location>,
    permissions: PermissionEvaluator,
}

impl IntegrationService {
    /// Create a new integration service.
    pub fn new(records: Arc<dyn RecordStore>, permissions: PermissionEvaluator) -> Self {
        Self {
            settings: TenantRepository::new(records.clone()),
            secrets: TenantRepository::new(records.clone()),
            jobs: TenantRepository::new(records.clone()),
            locations: TenantRepository::new(records),
            permissions,
        }
    }

    /// Current sheet settings.
    pub async fn sheets(&self, ctx: &RequestContext) -> AppResult<SheetsSettingsView> {
        ctx.authorize(&self.permissions, Module::Integrations, Action::Read).await?;
        self.view(&ctx.tenant()).await
    }

    /// Create or replace the sheet settings, and the token when given.
    pub async fn put_sheets(&self, ctx: &RequestContext, input: SheetsSettingsInput) -> AppResult<SheetsSettingsView> {
        ctx.authorize(&self.permissions, Module::Integrations, Action::Update).await?;
        validate_input(&input)?;
        let tenant = ctx.tenant();
        self.locations.get(&tenant, input.location_id).await?;

        let now = Utc::now();
        match self.settings.find_one(&tenant, provider_filter()).await? {
            Some(existing) => {
                let mut patch = Map::new();
                patch.insert("spreadsheet_id".to_string(), json!(input.spreadsheet_id.trim()));
                patch.insert("range".to_string(), json!(input.range.trim()));
                patch.insert("location_id".to_string(), json!(input.location_id));
                patch.insert("enabled".to_string(), json!(input.enabled));
                patch.insert("updated_at".to_string(), json!(now));
                self.settings
                    .update(&tenant, existing.id, patch)
                    .await?
                    .ok_or_else(|| AppError::conflict("Integration settings changed concurrently"))?;
            }
            None => {
                let settings = IntegrationSettings {
                    id: Uuid::now_v7(),
                    company_id: Uuid::nil(),
                    provider: GOOGLE_SHEETS.to_string(),
                    spreadsheet_id: input.spreadsheet_id.trim().to_string(),
                    range: input.range.trim().to_string(),
                    location_id: input.location_id,
                    enabled: input.enabled,
                    last_synced_at: None,
                    created_at: now,
                    updated_at: now,
                };
                self.settings.create(&tenant, &settings).await?;
            }
        }

        if let Some(token) = input.access_token {
            self.store_secret(&tenant, token, input.token_expires_at).await?;
        }

        info!(company_id = ?ctx.company_id, enabled = input.enabled, "Sheet integration configured");
        self.view(&tenant).await
    }

    /// One page of import runs, newest first.
    pub async fn imports(&self, ctx: &RequestContext, page: PageRequest) -> AppResult<PageResponse<ImportJob>> {
        ctx.authorize(&self.permissions, Module::Imports, Action::Read).await?;
        self.jobs
            .find_page(&ctx.tenant(), Filter::new(), vec![SortField::desc("started_at")], page)
            .await
    }

    async fn store_secret(&self, tenant: &TenantContext, token: String, expires_at: Option<DateTime<Utc>>) -> AppResult<()> {
        let now = Utc::now();
        match self.secrets.find_one(tenant, provider_filter()).await? {
            Some(existing) => {
                let mut patch = Map::new();
                patch.insert("access_token".to_string(), json!(token));
                patch.insert("expires_at".to_string(), json!(expires_at));
                patch.insert("updated_at".to_string(), json!(now));
                self.secrets.update(tenant, existing.id, patch).await?;
            }
            None => {
                let secret = IntegrationSecret {
                    id: Uuid::now_v7(),
                    company_id: Uuid::nil(),
                    provider: GOOGLE_SHEETS.to_string(),
                    access_token: token,
                    expires_at,
                    updated_at: now,
                };
                self.secrets.create(tenant, &secret).await?;
            }
        }
        Ok(())
    }

    async fn view(&self, tenant: &TenantContext) -> AppResult<SheetsSettingsView> {
        let settings = self.settings.find_one(tenant, provider_filter()).await?;
        let has_access_token = self.secrets.count(tenant, provider_filter()).await? > 0;
        Ok(SheetsSettingsView {
            settings,
            has_access_token,
        })
    }
}

fn provider_filter() -> Filter {
    Filter::new().eq("provider", GOOGLE_SHEETS)
}
