//! JWT token validation.
//!
//! Every failure maps to the same `Unauthorized` error; the specific
//! reason is only logged.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::de::DeserializeOwned;
use tracing::debug;

use stockdesk_core::config::AuthConfig;
use stockdesk_core::error::AppError;

use super::claims::{AccessClaims, RefreshClaims, TokenType};

/// Message returned for every rejected credential.
pub const INVALID_CREDENTIAL: &str = "Invalid or expired credentials";

/// Verifies access and refresh tokens, each against its own key.
#[derive(Clone)]
pub struct JwtDecoder {
    access_key: DecodingKey,
    refresh_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Create a decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            access_key: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_key: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            validation,
        }
    }

    /// Verify an access token.
    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        let claims: AccessClaims = self.decode_with(token, &self.access_key, "access")?;
        if claims.token_type != TokenType::Access {
            debug!("Rejected token: not an access token");
            return Err(AppError::unauthorized(INVALID_CREDENTIAL));
        }
        Ok(claims)
    }

    /// Verify a refresh token.
    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        let claims: RefreshClaims = self.decode_with(token, &self.refresh_key, "refresh")?;
        if claims.token_type != TokenType::Refresh {
            debug!("Rejected token: not a refresh token");
            return Err(AppError::unauthorized(INVALID_CREDENTIAL));
        }
        Ok(claims)
    }

    fn decode_with<T: DeserializeOwned>(
        &self,
        token: &str,
        key: &DecodingKey,
        kind: &'static str,
    ) -> Result<T, AppError> {
        decode::<T>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(token_kind = kind, reason = %e, "Rejected token");
                AppError::unauthorized(INVALID_CREDENTIAL)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use chrono::Utc;
    use stockdesk_entity::user::User;
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret-for-tests".to_string(),
            refresh_token_secret: "refresh-secret-for-tests".to_string(),
            ..AuthConfig::default()
        }
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "ana@shop.test".to_string(),
            password_hash: String::new(),
            name: "Ana".to_string(),
            company_id: Some(Uuid::new_v4()),
            role_id: Some(Uuid::new_v4()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_access_token_round_trip_keeps_tenant() {
        let config = config();
        let user = user();
        let (token, _) = JwtEncoder::new(&config).encode_access(&user).unwrap();
        let claims = JwtDecoder::new(&config).decode_access(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.company_id, user.company_id);
        assert_eq!(claims.role_id, user.role_id);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);
        let user = user();

        let (access, _) = encoder.encode_access(&user).unwrap();
        let refresh = encoder
            .encode_refresh(user.id, "sid", Utc::now() + encoder.refresh_ttl())
            .unwrap();

        assert!(decoder.decode_refresh(&access).is_err());
        assert!(decoder.decode_access(&refresh).is_err());
    }

    #[test]
    fn test_expired_and_garbage_tokens_fail_the_same_way() {
        let config = config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);
        let expired = encoder
            .encode_refresh(Uuid::new_v4(), "sid", Utc::now() - chrono::Duration::minutes(5))
            .unwrap();

        let a = decoder.decode_refresh(&expired).unwrap_err();
        let b = decoder.decode_refresh("not-a-jwt").unwrap_err();
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.message, b.message);
    }
}
