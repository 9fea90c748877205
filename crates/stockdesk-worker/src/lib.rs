//! Scheduled background work for StockDesk.
//!
//! - [`CronScheduler`] registers jobs with `tokio-cron-scheduler`
//! - [`SheetSyncJob`] imports daily POS summaries from Google Sheets for
//!   every company, guarded by a central lease so only one worker runs it
//! - [`sheets`] holds the row source trait and the Google Sheets client

pub mod jobs;
pub mod scheduler;
pub mod sheets;

pub use jobs::sheet_sync::{SheetSyncJob, SyncReport};
pub use scheduler::CronScheduler;
pub use sheets::{GoogleSheetsSource, SheetSource};
