//! Token signing and password policy configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    #[serde(default)]
    pub access_token_secret: String,
    /// HMAC secret for refresh tokens. Must differ from the access secret.
    #[serde(default)]
    pub refresh_token_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token and refresh session lifetime in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Company invite lifetime in hours.
    #[serde(default = "default_invite_ttl")]
    pub invite_ttl_hours: u64,
}

impl AuthConfig {
    /// Reject empty or shared signing secrets.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.access_token_secret.trim().is_empty() || self.refresh_token_secret.trim().is_empty()
        {
            return Err(AppError::configuration(
                "auth.access_token_secret and auth.refresh_token_secret must be set",
            ));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(AppError::configuration(
                "Access and refresh tokens must be signed with distinct secrets",
            ));
        }
        if self.access_token_ttl_minutes == 0 || self.refresh_token_ttl_days == 0 {
            return Err(AppError::configuration("Token lifetimes must be positive"));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            password_min_length: default_password_min(),
            invite_ttl_hours: default_invite_ttl(),
        }
    }
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    7
}

fn default_password_min() -> usize {
    10
}

fn default_invite_ttl() -> u64 {
    72
}
