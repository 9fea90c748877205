//! Cross-tenant Google Sheets sync.
//!
//! One run walks every company under a central lease. Each company is
//! processed under its own tenant context: the enabled sheet settings and
//! token are read, rows fetched and parsed, an [`ImportJob`] recorded, and
//! the [`PosSummary`] rows of every business day present in the sheet are
//! replaced.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde_json::{Map, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use stockdesk_cache::LeaseLock;
use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::Filter;
use stockdesk_database::{AccountStore, RecordStore, TenantContext, TenantRepository};
use stockdesk_entity::integration::{
    GOOGLE_SHEETS, ImportJob, ImportSource, ImportStatus, IntegrationSecret, IntegrationSettings, PosSummary,
};

use crate::sheets::{SheetSource, parse_rows};

/// Lease name shared by every worker running the sync.
pub const LEASE_NAME: &str = "sheet-sync";

/// Outcome of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Companies whose sheet was imported.
    pub companies: usize,
    /// Summary rows written across all companies.
    pub rows_imported: usize,
    /// Companies whose import failed.
    pub failures: usize,
}

/// The scheduled sheet import.
#[derive(Debug, Clone)]
pub struct SheetSyncJob {
    accounts: Arc<dyn AccountStore>,
    settings: TenantRepository<IntegrationSettings>,
    secrets: TenantRepository<IntegrationSecret>,
    jobs: TenantRepository<ImportJob>,
    summaries: TenantRepository<PosSummary>,
    source: Arc<dyn SheetSource>,
    lease: LeaseLock,
    lease_ttl: Duration,
}

impl SheetSyncJob {
    /// Create the job.
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        records: Arc<dyn RecordStore>,
        source: Arc<dyn SheetSource>,
        lease: LeaseLock,
        lease_ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            settings: TenantRepository::new(records.clone()),
            secrets: TenantRepository::new(records.clone()),
            jobs: TenantRepository::new(records.clone()),
            summaries: TenantRepository::new(records),
            source,
            lease,
            lease_ttl,
        }
    }

    /// Run once. Returns an empty report without touching storage when
    /// another worker holds the lease.
    pub async fn run(&self) -> AppResult<SyncReport> {
        let Some(lease) = self.lease.try_acquire(LEASE_NAME, self.lease_ttl).await? else {
            info!("Sheet sync skipped: lease held by another worker");
            return Ok(SyncReport::default());
        };

        let outcome = self.run_locked().await;

        if let Err(e) = lease.release().await {
            warn!(error = %e, "Failed to release sheet sync lease");
        }

        let report = outcome?;
        info!(
            companies = report.companies,
            rows = report.rows_imported,
            failures = report.failures,
            "Sheet sync finished"
        );
        Ok(report)
    }

    async fn run_locked(&self) -> AppResult<SyncReport> {
        let mut report = SyncReport::default();

        for company_id in self.accounts.list_company_ids().await? {
            let ctx = TenantContext::for_company(company_id);
            match self.sync_company(&ctx).await {
                Ok(Some(rows)) => {
                    report.companies += 1;
                    report.rows_imported += rows;
                }
                Ok(None) => {}
                Err(e) => {
                    error!(company_id = %company_id, error = %e, "Sheet sync failed for company");
                    report.failures += 1;
                }
            }
        }
        Ok(report)
    }

    /// Import one company. `None` when the company has no enabled sheet.
    async fn sync_company(&self, ctx: &TenantContext) -> AppResult<Option<usize>> {
        let provider = Filter::new().eq("provider", GOOGLE_SHEETS);
        let Some(settings) = self
            .settings
            .find_one(ctx, provider.clone().eq("enabled", true))
            .await?
        else {
            return Ok(None);
        };

        let job = ImportJob {
            id: Uuid::now_v7(),
            company_id: settings.company_id,
            source: ImportSource::GoogleSheets,
            status: ImportStatus::Running,
            rows_seen: 0,
            rows_imported: 0,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        };
        let job = self.jobs.create(ctx, &job).await?;

        match self.import(ctx, &settings, &job, provider).await {
            Ok((seen, imported)) => {
                let now = Utc::now();
                let mut patch = Map::new();
                patch.insert("status".to_string(), json!(ImportStatus::Completed));
                patch.insert("rows_seen".to_string(), json!(seen));
                patch.insert("rows_imported".to_string(), json!(imported));
                patch.insert("finished_at".to_string(), json!(now));
                self.jobs.update(ctx, job.id, patch).await?;

                let mut synced = Map::new();
                synced.insert("last_synced_at".to_string(), json!(now));
                self.settings.update(ctx, settings.id, synced).await?;
                Ok(Some(imported))
            }
            Err(e) => {
                let mut patch = Map::new();
                patch.insert("status".to_string(), json!(ImportStatus::Failed));
                patch.insert("error".to_string(), json!(e.message));
                patch.insert("finished_at".to_string(), json!(Utc::now()));
                self.jobs.update(ctx, job.id, patch).await?;
                Err(e)
            }
        }
    }

    /// Fetch, parse, and store. Returns `(rows seen, rows imported)`.
    async fn import(
        &self,
        ctx: &TenantContext,
        settings: &IntegrationSettings,
        job: &ImportJob,
        provider: Filter,
    ) -> AppResult<(usize, usize)> {
        let secret = self
            .secrets
            .find_one(ctx, provider)
            .await?
            .ok_or_else(|| AppError::validation("No Google Sheets access token is configured"))?;
        if secret.is_expired(Utc::now()) {
            return Err(AppError::validation("The Google Sheets access token has expired"));
        }

        let raw = self.source.fetch_rows(settings, &secret).await?;
        let rows = parse_rows(&raw);

        let days: BTreeSet<NaiveDate> = rows.iter().map(|r| r.business_date).collect();
        for day in &days {
            self.summaries
                .delete_many(ctx, Filter::new().eq("business_date", day.to_string()))
                .await?;
        }

        let now = Utc::now();
        for row in &rows {
            let summary = PosSummary {
                id: Uuid::now_v7(),
                company_id: settings.company_id,
                business_date: row.business_date,
                sku: row.sku.clone(),
                quantity: row.quantity,
                gross_cents: row.gross_cents,
                import_job_id: job.id,
                created_at: now,
            };
            self.summaries.create(ctx, &summary).await?;
        }

        Ok((raw.len(), rows.len()))
    }
}
