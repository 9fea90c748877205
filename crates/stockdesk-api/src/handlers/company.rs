//! Company, invite, and membership handlers.

use axum::Json;
use axum::extract::State;

use stockdesk_entity::company::Company;
use stockdesk_service::company::{
    AcceptInviteInput, CreateCompanyInput, CreateInviteInput, CreatedCompany, CreatedInvite,
};

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/companies
///
/// The caller's token still carries no company; the client refreshes to
/// pick up the new tenant and owner role.
pub async fn create_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateCompanyInput>,
) -> Result<Json<ApiResponse<CreatedCompany>>, ApiError> {
    let created = state.company_service.create_company(&auth, req).await?;
    Ok(Json(ApiResponse::ok(created)))
}

/// GET /api/companies/current
pub async fn current_company(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Company>>, ApiError> {
    let company = state.company_service.current(&auth).await?;
    Ok(Json(ApiResponse::ok(company)))
}

/// POST /api/companies/invites
pub async fn create_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateInviteInput>,
) -> Result<Json<ApiResponse<CreatedInvite>>, ApiError> {
    let invite = state.company_service.create_invite(&auth, req).await?;
    Ok(Json(ApiResponse::ok(invite)))
}

/// POST /api/companies/invites/accept
pub async fn accept_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AcceptInviteInput>,
) -> Result<Json<ApiResponse<Company>>, ApiError> {
    let company = state.company_service.accept_invite(&auth, req).await?;
    Ok(Json(ApiResponse::ok(company)))
}
