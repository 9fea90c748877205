//! Route definitions for the StockDesk HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(company_routes())
        .merge(role_routes())
        .merge(item_routes())
        .merge(location_routes())
        .merge(inventory_routes())
        .merge(integration_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Registration, login, refresh rotation, logout, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// Company creation and membership
fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/companies", post(handlers::company::create_company))
        .route("/companies/current", get(handlers::company::current_company))
        .route("/companies/invites", post(handlers::company::create_invite))
        .route("/companies/invites/accept", post(handlers::company::accept_invite))
}

fn role_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/roles",
            get(handlers::role::list_roles).post(handlers::role::create_role),
        )
        .route(
            "/roles/{id}",
            get(handlers::role::get_role)
                .put(handlers::role::update_role)
                .delete(handlers::role::delete_role),
        )
        .route("/roles/{id}/assign", post(handlers::role::assign_role))
}

fn item_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(handlers::item::list_items).post(handlers::item::create_item),
        )
        .route(
            "/items/{id}",
            get(handlers::item::get_item)
                .put(handlers::item::update_item)
                .delete(handlers::item::delete_item),
        )
}

fn location_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/locations",
            get(handlers::location::list_locations).post(handlers::location::create_location),
        )
        .route(
            "/locations/{id}",
            get(handlers::location::get_location)
                .put(handlers::location::update_location)
                .delete(handlers::location::delete_location),
        )
}

/// Ledger (append-only) and derived stock levels
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/inventory/ledger",
            get(handlers::inventory::list_entries).post(handlers::inventory::record_entry),
        )
        .route(
            "/inventory/ledger/{id}",
            get(handlers::inventory::get_entry)
                .put(handlers::inventory::update_entry)
                .patch(handlers::inventory::update_entry)
                .delete(handlers::inventory::delete_entry),
        )
        .route(
            "/inventory/ledger/{id}/correct",
            post(handlers::inventory::correct_entry),
        )
        .route("/inventory/stock", get(handlers::inventory::stock))
}

fn integration_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/integrations/sheets",
            get(handlers::integration::get_sheets).put(handlers::integration::put_sheets),
        )
        .route("/imports", get(handlers::integration::list_imports))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
