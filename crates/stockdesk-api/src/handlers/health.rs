//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use stockdesk_core::traits::cache::CacheProvider;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database = state.stores.records.health_check().await.unwrap_or(false);
    let cache = state.cache.health_check().await.unwrap_or(false);

    let (status, label) = if database && cache {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!(database, cache, "Health check degraded");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(ApiResponse::ok(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: up_down(database),
            cache: up_down(cache),
        })),
    )
}

fn up_down(ok: bool) -> String {
    if ok { "connected" } else { "unavailable" }.to_string()
}
