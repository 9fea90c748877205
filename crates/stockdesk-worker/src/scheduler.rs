//! Cron scheduler for periodic background tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info};

use stockdesk_core::error::AppError;

use crate::jobs::sheet_sync::SheetSyncJob;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self { scheduler })
    }

    /// Run the sheet sync on `cron` (six-field, seconds first).
    pub async fn register_sheet_sync(&self, job: Arc<SheetSyncJob>, cron: &str) -> Result<(), AppError> {
        let schedule = CronJob::new_async(cron, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                debug!("Running scheduled sheet sync");
                if let Err(e) = job.run().await {
                    error!(error = %e, "Scheduled sheet sync failed");
                }
            })
        })
        .map_err(|e| AppError::configuration(format!("Invalid sheet sync schedule '{cron}': {e}")))?;

        self.scheduler
            .add(schedule)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sheet sync schedule: {e}")))?;

        info!(cron, "Registered: sheet_sync");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        info!("Cron scheduler started");
        Ok(())
    }

    /// Shut the scheduler down.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;
        info!("Cron scheduler shut down");
        Ok(())
    }
}
