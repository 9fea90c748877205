//! JWT token creation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use stockdesk_core::config::AuthConfig;
use stockdesk_core::error::AppError;
use stockdesk_entity::user::User;

use super::claims::{AccessClaims, RefreshClaims, TokenType};

/// Signs access and refresh tokens with separate keys.
#[derive(Clone)]
pub struct JwtEncoder {
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtEncoder {
    /// Create an encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_key: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes as i64),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days as i64),
        }
    }

    /// Lifetime of refresh tokens and refresh sessions.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign an access token reflecting the user's current company and role.
    pub fn encode_access(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        let now = Utc::now();
        let exp = now + self.access_ttl;
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            company_id: user.company_id,
            role_id: user.role_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
            token_type: TokenType::Access,
        };

        let token = encode(&Header::default(), &claims, &self.access_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;
        Ok((token, exp))
    }

    /// Sign a refresh token carrying the raw session identifier.
    pub fn encode_refresh(
        &self,
        user_id: Uuid,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = RefreshClaims {
            sub: user_id,
            sid: session_id.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            token_type: TokenType::Refresh,
        };

        encode(&Header::default(), &claims, &self.refresh_key)
            .map_err(|e| AppError::internal(format!("Failed to encode refresh token: {e}")))
    }
}
