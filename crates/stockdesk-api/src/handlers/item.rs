//! Catalogue item handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use stockdesk_core::types::PageResponse;
use stockdesk_entity::inventory::Item;
use stockdesk_service::inventory::{CreateItemInput, ItemListQuery, UpdateItemInput};

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/items?search=&active=&page=&per_page=
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ItemListQuery>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Item>>>, ApiError> {
    let items = state
        .item_service
        .list(&auth, query, page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(items)))
}

/// GET /api/items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let item = state.item_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(item)))
}

/// POST /api/items
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateItemInput>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let item = state.item_service.create(&auth, req).await?;
    Ok(Json(ApiResponse::ok(item)))
}

/// PUT /api/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemInput>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let item = state.item_service.update(&auth, id, req).await?;
    Ok(Json(ApiResponse::ok(item)))
}

/// DELETE /api/items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.item_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Item deleted"))))
}
