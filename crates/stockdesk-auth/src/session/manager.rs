//! Session lifecycle manager: login, issue, rotation, logout.
//!
//! A refresh token carries a random session identifier. Only the hash of
//! that identifier is stored, as a [`RefreshSession`] row. Rotation
//! revokes the presented row, links it to its successor, and inserts the
//! successor in one store call, so presenting a rotated token again finds
//! a revoked row and is rejected.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use stockdesk_core::config::AuthConfig;
use stockdesk_core::error::AppError;
use stockdesk_core::types::UserId;
use stockdesk_database::{AccountStore, RefreshSessionStore};
use stockdesk_entity::session::{NewRefreshSession, RefreshSession};
use stockdesk_entity::user::User;

use crate::jwt::decoder::INVALID_CREDENTIAL;
use crate::jwt::{AccessClaims, JwtDecoder, JwtEncoder};
use crate::password::PasswordHasher;
use crate::token::{generate_token, hash_token};

/// Credentials handed to the client after login, registration, or refresh.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The user, as stored at issue time.
    pub user: User,
    /// Signed access token.
    pub access_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Signed refresh token carrying the raw session identifier.
    pub refresh_token: String,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Owns refresh sessions and signs tokens.
#[derive(Clone)]
pub struct SessionManager {
    encoder: Arc<JwtEncoder>,
    decoder: Arc<JwtDecoder>,
    sessions: Arc<dyn RefreshSessionStore>,
    accounts: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("refresh_ttl", &self.encoder.refresh_ttl())
            .finish()
    }
}

impl SessionManager {
    /// Create a manager. Fails if the configured secrets are unusable.
    pub fn new(
        config: &AuthConfig,
        sessions: Arc<dyn RefreshSessionStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            encoder: Arc::new(JwtEncoder::new(config)),
            decoder: Arc::new(JwtDecoder::new(config)),
            sessions,
            accounts,
            hasher: PasswordHasher::new(),
        })
    }

    /// Verify email and password, then issue a session.
    ///
    /// Unknown email, wrong password, and inactive account produce the
    /// same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, AppError> {
        let rejected = || AppError::unauthorized("Invalid email or password");

        let Some(user) = self.accounts.find_user_by_email(email).await? else {
            debug!("Login rejected: unknown email");
            return Err(rejected());
        };
        if !self.hasher.verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(rejected());
        }
        if !user.is_active {
            warn!(user_id = %user.id, "Login rejected: account inactive");
            return Err(rejected());
        }

        let issued = self.issue_session(&user).await?;
        info!(user_id = %user.id, "Login successful");
        Ok(issued)
    }

    /// Create a refresh session for `user` and sign both tokens.
    pub async fn issue_session(&self, user: &User) -> Result<IssuedSession, AppError> {
        let session_id = generate_token();
        let expires_at = Utc::now() + self.encoder.refresh_ttl();

        self.sessions
            .create(NewRefreshSession {
                user_id: user.id,
                token_hash: hash_token(&session_id),
                expires_at,
            })
            .await?;

        debug!(user_id = %user.id, "Refresh session issued");
        self.sign(user.clone(), &session_id, expires_at)
    }

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// The presented session is consumed. Every failure, including store
    /// errors, is reported as the same `Unauthorized`, and the caller must
    /// clear the client's refresh credential.
    pub async fn rotate(&self, refresh_token: &str) -> Result<IssuedSession, AppError> {
        let claims = self.decoder.decode_refresh(refresh_token)?;
        let current_hash = hash_token(&claims.sid);
        let now = Utc::now();

        let session = self
            .sessions
            .find_by_hash(&current_hash)
            .await
            .map_err(|e| store_failure("look up refresh session", e))?
            .ok_or_else(|| reject(claims.sub, "unknown refresh session"))?;

        check_presented(&session, claims.sub, now)?;

        let user = self
            .accounts
            .find_user(UserId::from_uuid(session.user_id))
            .await
            .map_err(|e| store_failure("load user", e))?
            .ok_or_else(|| reject(session.user_id, "user no longer exists"))?;
        if !user.is_active {
            return Err(reject(user.id, "user is inactive"));
        }

        let successor_id = generate_token();
        let successor = NewRefreshSession {
            user_id: user.id,
            token_hash: hash_token(&successor_id),
            expires_at: now + self.encoder.refresh_ttl(),
        };
        let expires_at = successor.expires_at;

        // No retry: a failed rotation leaves either both writes or neither.
        let rotated = self
            .sessions
            .rotate(&current_hash, successor, now)
            .await
            .map_err(|e| store_failure("rotate refresh session", e))?;
        if rotated.is_none() {
            return Err(reject(user.id, "refresh session claimed by a concurrent rotation"));
        }

        info!(user_id = %user.id, "Refresh session rotated");
        self.sign(user, &successor_id, expires_at)
    }

    /// Revoke the session behind a refresh token.
    ///
    /// Best effort: malformed, expired, unknown, or already revoked tokens
    /// are ignored.
    pub async fn revoke(&self, refresh_token: &str) {
        let Ok(claims) = self.decoder.decode_refresh(refresh_token) else {
            debug!("Logout with unusable refresh token");
            return;
        };

        match self
            .sessions
            .revoke(&hash_token(&claims.sid), Utc::now())
            .await
        {
            Ok(true) => info!(user_id = %claims.sub, "Refresh session revoked"),
            Ok(false) => debug!(user_id = %claims.sub, "Refresh session already revoked"),
            Err(e) => warn!(user_id = %claims.sub, error = %e, "Failed to revoke refresh session"),
        }
    }

    /// Verify a bearer access token.
    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims, AppError> {
        self.decoder.decode_access(access_token)
    }

    fn sign(
        &self,
        user: User,
        session_id: &str,
        refresh_expires_at: DateTime<Utc>,
    ) -> Result<IssuedSession, AppError> {
        let (access_token, access_expires_at) = self.encoder.encode_access(&user)?;
        let refresh_token = self
            .encoder
            .encode_refresh(user.id, session_id, refresh_expires_at)?;

        Ok(IssuedSession {
            user,
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
        })
    }
}

/// Require the presented session to be usable by `subject` at `now`.
fn check_presented(session: &RefreshSession, subject: uuid::Uuid, now: DateTime<Utc>) -> Result<(), AppError> {
    if session.user_id != subject {
        return Err(reject(subject, "refresh token subject does not own the session"));
    }
    if session.is_rotated() {
        warn!(
            user_id = %session.user_id,
            session = %session.id,
            "Refresh token reuse detected: presented session was already rotated"
        );
        return Err(AppError::unauthorized(INVALID_CREDENTIAL));
    }
    if session.revoked_at.is_some() {
        return Err(reject(subject, "refresh session revoked"));
    }
    if session.expires_at <= now {
        return Err(reject(subject, "refresh session expired"));
    }
    Ok(())
}

fn reject(user_id: uuid::Uuid, reason: &'static str) -> AppError {
    warn!(user_id = %user_id, reason, "Refresh rejected");
    AppError::unauthorized(INVALID_CREDENTIAL)
}

fn store_failure(step: &'static str, e: AppError) -> AppError {
    error!(step, error = %e, "Refresh failed on storage error");
    AppError::unauthorized(INVALID_CREDENTIAL)
}
