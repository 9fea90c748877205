//! Role handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use stockdesk_entity::role::Role;
use stockdesk_service::role::{AssignRoleInput, CreateRoleInput, UpdateRoleInput};

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/roles
pub async fn list_roles(State(state): State<AppState>, auth: AuthUser) -> Result<Json<ApiResponse<Vec<Role>>>, ApiError> {
    let roles = state.role_service.list(&auth).await?;
    Ok(Json(ApiResponse::ok(roles)))
}

/// GET /api/roles/{id}
pub async fn get_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Role>>, ApiError> {
    let role = state.role_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(role)))
}

/// POST /api/roles
pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRoleInput>,
) -> Result<Json<ApiResponse<Role>>, ApiError> {
    let role = state.role_service.create(&auth, req).await?;
    Ok(Json(ApiResponse::ok(role)))
}

/// PUT /api/roles/{id}
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleInput>,
) -> Result<Json<ApiResponse<Role>>, ApiError> {
    let role = state.role_service.update(&auth, id, req).await?;
    Ok(Json(ApiResponse::ok(role)))
}

/// DELETE /api/roles/{id}
pub async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.role_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Role deleted"))))
}

/// POST /api/roles/{id}/assign
pub async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRoleInput>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.role_service.assign(&auth, id, req).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Role assigned"))))
}
