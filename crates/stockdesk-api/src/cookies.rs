//! The refresh-token cookie.
//!
//! The refresh token never appears in a response body. It travels in an
//! `HttpOnly`, `SameSite=Lax` cookie scoped to the auth routes.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use stockdesk_core::config::AppConfig;

/// Read the refresh token from the request cookies.
pub fn refresh_token(jar: &CookieJar, config: &AppConfig) -> Option<String> {
    jar.get(&config.session.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Add the refresh cookie carrying `token`.
pub fn set_refresh(jar: CookieJar, config: &AppConfig, token: String) -> CookieJar {
    let max_age = time::Duration::days(config.auth.refresh_token_ttl_days as i64);
    jar.add(build(config, token, max_age))
}

/// Replace the refresh cookie with an empty one that expires immediately.
pub fn clear_refresh(jar: CookieJar, config: &AppConfig) -> CookieJar {
    jar.add(build(config, String::new(), time::Duration::ZERO))
}

fn build(config: &AppConfig, value: String, max_age: time::Duration) -> Cookie<'static> {
    let secure = config.session.secure_cookie(config.server.is_development());
    Cookie::build((config.session.cookie_name.clone(), value))
        .path(config.session.cookie_path.clone())
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}
