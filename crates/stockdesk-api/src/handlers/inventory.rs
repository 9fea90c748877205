//! Inventory ledger and stock handlers.
//!
//! The ledger is append-only. `PUT`, `PATCH` and `DELETE` on an entry are
//! routed so that the caller gets an explicit `IMMUTABLE_ENTITY` answer
//! (after the permission check) instead of a 405.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde_json::{Map, Value};
use uuid::Uuid;

use stockdesk_core::types::PageResponse;
use stockdesk_entity::inventory::LedgerEntry;
use stockdesk_service::inventory::{CorrectEntryInput, LedgerListQuery, RecordEntryInput, StockLevel};

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/inventory/ledger?item_id=&location_id=&page=&per_page=
pub async fn list_entries(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LedgerListQuery>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<LedgerEntry>>>, ApiError> {
    let entries = state
        .ledger_service
        .list(&auth, query, page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// GET /api/inventory/ledger/{id}
pub async fn get_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LedgerEntry>>, ApiError> {
    let entry = state.ledger_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// POST /api/inventory/ledger
pub async fn record_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RecordEntryInput>,
) -> Result<Json<ApiResponse<LedgerEntry>>, ApiError> {
    let entry = state.ledger_service.record(&auth, req).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// PUT/PATCH /api/inventory/ledger/{id}
pub async fn update_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<ApiResponse<LedgerEntry>>, ApiError> {
    let entry = state.ledger_service.update(&auth, id, patch).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// DELETE /api/inventory/ledger/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.ledger_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Entry deleted"))))
}

/// POST /api/inventory/ledger/{id}/correct
pub async fn correct_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<CorrectEntryInput>>,
) -> Result<Json<ApiResponse<LedgerEntry>>, ApiError> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let entry = state.ledger_service.correct(&auth, id, input).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// GET /api/inventory/stock?item_id=&location_id=
pub async fn stock(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LedgerListQuery>,
) -> Result<Json<ApiResponse<Vec<StockLevel>>>, ApiError> {
    let levels = state.ledger_service.stock(&auth, query).await?;
    Ok(Json(ApiResponse::ok(levels)))
}
