//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use stockdesk_auth::SessionManager;
use stockdesk_cache::CacheManager;
use stockdesk_core::config::AppConfig;
use stockdesk_database::Stores;
use stockdesk_service::{
    AccountService, CompanyService, IntegrationService, ItemService, LedgerService, LocationService, RoleService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped or cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Storage backends
    pub stores: Stores,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,

    // ── Auth ─────────────────────────────────────────────────
    /// Refresh-session lifecycle and token signing
    pub session_manager: Arc<SessionManager>,

    // ── Services ─────────────────────────────────────────────
    /// Registration and profiles
    pub account_service: AccountService,
    /// Companies and invites
    pub company_service: CompanyService,
    /// Roles
    pub role_service: RoleService,
    /// Catalogue items
    pub item_service: ItemService,
    /// Stock locations
    pub location_service: LocationService,
    /// Inventory ledger
    pub ledger_service: LedgerService,
    /// Sheet integration and import history
    pub integration_service: IntegrationService,
}
