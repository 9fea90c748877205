//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockdesk_auth::IssuedSession;
use stockdesk_entity::user::User;
use stockdesk_service::account::Profile;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body returned by login, register, and refresh. The refresh token is
/// set as a cookie and never included here.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// The authenticated user.
    pub user: User,
}

impl From<&IssuedSession> for SessionResponse {
    fn from(session: &IssuedSession) -> Self {
        Self {
            access_token: session.access_token.clone(),
            access_expires_at: session.access_expires_at,
            user: session.user.clone(),
        }
    }
}

/// `GET /auth/me` body: what the token claims plus the stored profile.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// User ID from the token.
    pub user_id: Uuid,
    /// Company claimed by the token.
    pub company_id: Option<Uuid>,
    /// Role claimed by the token.
    pub role_id: Option<Uuid>,
    /// Stored profile, which may be ahead of the token's claims.
    pub profile: Profile,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` when every dependency answered, `degraded` otherwise.
    pub status: String,
    /// Version.
    pub version: String,
    /// Store status.
    pub database: String,
    /// Cache status.
    pub cache: String,
}
