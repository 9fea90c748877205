//! Auth handlers: register, login, refresh, logout, me.
//!
//! The refresh token only ever travels in the refresh cookie. A refresh
//! that fails for any reason clears the cookie and answers 401 with the
//! same body, whatever the cause.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use stockdesk_core::error::AppError;
use stockdesk_service::account::RegisterInput;
use stockdesk_service::validation::validate_input;

use crate::cookies;
use crate::dto::request::LoginRequest;
use crate::dto::response::{ApiResponse, MeResponse, MessageResponse, SessionResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterInput>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    let session = state.account_service.register(req).await?;
    let body = SessionResponse::from(&session);
    let jar = cookies::set_refresh(jar, &state.config, session.refresh_token);
    Ok((jar, Json(ApiResponse::ok(body))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    validate_input(&req)?;
    let session = state.session_manager.login(&req.email, &req.password).await?;
    let body = SessionResponse::from(&session);
    let jar = cookies::set_refresh(jar, &state.config, session.refresh_token);
    Ok((jar, Json(ApiResponse::ok(body))))
}

/// POST /api/auth/refresh
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(token) = cookies::refresh_token(&jar, &state.config) else {
        return rejected(jar, &state, AppError::unauthorized("Missing refresh token"));
    };

    match state.session_manager.rotate(&token).await {
        Ok(session) => {
            let body = SessionResponse::from(&session);
            let jar = cookies::set_refresh(jar, &state.config, session.refresh_token);
            (jar, Json(ApiResponse::ok(body))).into_response()
        }
        Err(e) => rejected(jar, &state, e),
    }
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    if let Some(token) = cookies::refresh_token(&jar, &state.config) {
        state.session_manager.revoke(&token).await;
    }
    let jar = cookies::clear_refresh(jar, &state.config);
    (jar, Json(ApiResponse::ok(MessageResponse::new("Logged out"))))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let profile = state.account_service.profile(&auth).await?;
    Ok(Json(ApiResponse::ok(MeResponse {
        user_id: auth.user_id.into_uuid(),
        company_id: auth.company_id.map(|c| c.into_uuid()),
        role_id: auth.role_id.map(|r| r.into_uuid()),
        profile,
    })))
}

/// Clear the refresh cookie and report the failure.
fn rejected(jar: CookieJar, state: &AppState, err: AppError) -> Response {
    let jar = cookies::clear_refresh(jar, &state.config);
    (jar, ApiError(err)).into_response()
}
