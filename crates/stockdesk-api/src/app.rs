//! Application builder: wires state, router and middleware into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use stockdesk_auth::{PasswordValidator, PermissionEvaluator, SessionManager};
use stockdesk_cache::{CacheManager, LeaseLock};
use stockdesk_core::config::AppConfig;
use stockdesk_core::error::AppError;
use stockdesk_core::traits::cache::CacheProvider;
use stockdesk_database::Stores;
use stockdesk_service::{
    AccountService, CompanyService, IntegrationService, ItemService, LedgerService, LocationService, LogNotifier,
    RoleService,
};
use stockdesk_worker::{CronScheduler, GoogleSheetsSource, SheetSyncJob};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Connects the configured backends and builds every service.
pub async fn build_state(config: AppConfig) -> Result<AppState, AppError> {
    // ── Step 1: Storage ──────────────────────────────────────────
    tracing::info!(provider = %config.database.provider, "Initializing storage");
    let stores = Stores::connect(&config.database).await?;

    // ── Step 2: Cache ────────────────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache");
    let cache = Arc::new(CacheManager::new(&config.cache).await?);

    // ── Step 3: Auth ─────────────────────────────────────────────
    let session_manager = Arc::new(SessionManager::new(
        &config.auth,
        stores.sessions.clone(),
        stores.accounts.clone(),
    )?);
    let password_validator = PasswordValidator::new(&config.auth);
    let permissions = PermissionEvaluator::new(stores.records.clone());

    // ── Step 4: Services ─────────────────────────────────────────
    let invite_ttl = chrono::Duration::hours(config.auth.invite_ttl_hours as i64);
    let account_service = AccountService::new(
        stores.accounts.clone(),
        Arc::clone(&session_manager),
        password_validator,
    );
    let company_service = CompanyService::new(
        stores.accounts.clone(),
        stores.records.clone(),
        permissions.clone(),
        Arc::new(LogNotifier),
        invite_ttl,
    );
    let role_service = RoleService::new(stores.records.clone(), stores.accounts.clone(), permissions.clone());
    let item_service = ItemService::new(stores.records.clone(), permissions.clone());
    let location_service = LocationService::new(stores.records.clone(), permissions.clone());
    let ledger_service = LedgerService::new(stores.records.clone(), permissions.clone());
    let integration_service = IntegrationService::new(stores.records.clone(), permissions);

    Ok(AppState {
        config: Arc::new(config),
        stores,
        cache,
        session_manager,
        account_service,
        company_service,
        role_service,
        item_service,
        location_service,
        ledger_service,
        integration_service,
    })
}

/// Runs the StockDesk server with the given configuration.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting StockDesk server...");

    check_lease_backend(&config)?;
    let state = build_state(config).await?;

    // ── Background jobs ──────────────────────────────────────────
    let mut scheduler = if state.config.worker.enabled {
        Some(start_scheduler(&state).await?)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── HTTP server ──────────────────────────────────────────────
    let addr = state.config.server.bind_address();
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("StockDesk server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    tracing::info!("StockDesk server stopped");
    Ok(())
}

/// The sheet sync lease must be visible to every instance. A memory
/// cache keeps it per process, which is only tolerated in development.
fn check_lease_backend(config: &AppConfig) -> Result<(), AppError> {
    if !config.worker.enabled || config.cache.provider != "memory" {
        return Ok(());
    }
    if config.server.is_development() {
        tracing::warn!("Sheet sync lease is process-local (cache.provider = \"memory\"); run a single instance");
        return Ok(());
    }
    Err(AppError::configuration(
        "The background worker needs a shared cache for its lease: set cache.provider = \"redis\" or worker.enabled = false",
    ))
}

async fn start_scheduler(state: &AppState) -> Result<CronScheduler, AppError> {
    let worker = &state.config.worker;
    let source = Arc::new(GoogleSheetsSource::new(&state.config.integrations.google_sheets)?);
    let cache: Arc<dyn CacheProvider> = state.cache.clone();
    let lease = LeaseLock::new(cache);
    let job = Arc::new(SheetSyncJob::new(
        state.stores.accounts.clone(),
        state.stores.records.clone(),
        source,
        lease,
        Duration::from_secs(worker.sheet_sync_lease_seconds),
    ));

    let scheduler = CronScheduler::new().await?;
    scheduler.register_sheet_sync(job, &worker.sheet_sync_cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
