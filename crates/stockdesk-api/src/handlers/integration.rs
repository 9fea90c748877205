//! Integration settings and import history handlers.

use axum::Json;
use axum::extract::{Query, State};

use stockdesk_core::types::PageResponse;
use stockdesk_entity::integration::ImportJob;
use stockdesk_service::integration::{SheetsSettingsInput, SheetsSettingsView};

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/integrations/sheets
pub async fn get_sheets(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<SheetsSettingsView>>, ApiError> {
    let view = state.integration_service.sheets(&auth).await?;
    Ok(Json(ApiResponse::ok(view)))
}

/// PUT /api/integrations/sheets
pub async fn put_sheets(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SheetsSettingsInput>,
) -> Result<Json<ApiResponse<SheetsSettingsView>>, ApiError> {
    let view = state.integration_service.put_sheets(&auth, req).await?;
    Ok(Json(ApiResponse::ok(view)))
}

/// GET /api/imports
pub async fn list_imports(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<ImportJob>>>, ApiError> {
    let jobs = state
        .integration_service
        .imports(&auth, page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(jobs)))
}
