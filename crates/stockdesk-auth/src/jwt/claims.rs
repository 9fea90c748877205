//! JWT claims carried by access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockdesk_core::types::{CompanyId, RoleId, UserId};

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token sent as a bearer header.
    Access,
    /// Long-lived token carried in the refresh cookie.
    Refresh,
}

/// Claims of an access token.
///
/// Stateless: a request is authenticated by signature and expiry alone.
/// Tenant and role are copied from the user at issue time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject, the user ID.
    pub sub: Uuid,
    /// User email.
    pub email: String,
    /// Company the user belonged to at issue time.
    pub company_id: Option<Uuid>,
    /// Role within that company.
    pub role_id: Option<Uuid>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token ID.
    pub jti: Uuid,
    /// Always [`TokenType::Access`].
    pub token_type: TokenType,
}

impl AccessClaims {
    /// The user ID.
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    /// The company, if the user had one when the token was issued.
    pub fn company(&self) -> Option<CompanyId> {
        self.company_id.map(CompanyId::from_uuid)
    }

    /// The role, if any.
    pub fn role(&self) -> Option<RoleId> {
        self.role_id.map(RoleId::from_uuid)
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Claims of a refresh token. `sid` is the raw session identifier whose
/// hash keys the server-side refresh session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject, the user ID.
    pub sub: Uuid,
    /// Raw session identifier.
    pub sid: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token ID.
    pub jti: Uuid,
    /// Always [`TokenType::Refresh`].
    pub token_type: TokenType,
}
