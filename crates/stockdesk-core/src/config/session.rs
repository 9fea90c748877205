//! Refresh-cookie transport configuration.

use serde::{Deserialize, Serialize};

/// Settings for the cookie that carries the refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie name.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Cookie path. Scoped to the auth routes so the browser only sends it there.
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    /// Force the `Secure` attribute on or off. When unset it is enabled
    /// everywhere except the development environment.
    #[serde(default)]
    pub cookie_secure: Option<bool>,
}

impl SessionConfig {
    /// Resolve the `Secure` attribute for the given environment.
    pub fn secure_cookie(&self, is_development: bool) -> bool {
        self.cookie_secure.unwrap_or(!is_development)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_path: default_cookie_path(),
            cookie_secure: None,
        }
    }
}

fn default_cookie_name() -> String {
    "refresh_token".to_string()
}

fn default_cookie_path() -> String {
    "/api/auth".to_string()
}
