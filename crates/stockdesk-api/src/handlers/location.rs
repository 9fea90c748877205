//! Stock location handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use stockdesk_entity::inventory::Location;
use stockdesk_service::inventory::{CreateLocationInput, UpdateLocationInput};

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/locations
pub async fn list_locations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Location>>>, ApiError> {
    let locations = state.location_service.list(&auth).await?;
    Ok(Json(ApiResponse::ok(locations)))
}

/// GET /api/locations/{id}
pub async fn get_location(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Location>>, ApiError> {
    let location = state.location_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(location)))
}

/// POST /api/locations
pub async fn create_location(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateLocationInput>,
) -> Result<Json<ApiResponse<Location>>, ApiError> {
    let location = state.location_service.create(&auth, req).await?;
    Ok(Json(ApiResponse::ok(location)))
}

/// PUT /api/locations/{id}
pub async fn update_location(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLocationInput>,
) -> Result<Json<ApiResponse<Location>>, ApiError> {
    let location = state.location_service.update(&auth, id, req).await?;
    Ok(Json(ApiResponse::ok(location)))
}

/// DELETE /api/locations/{id}
pub async fn delete_location(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.location_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Location deleted"))))
}
