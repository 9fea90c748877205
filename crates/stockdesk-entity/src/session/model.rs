//! Refresh session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Server-side record backing one refresh token.
///
/// The raw session identifier never reaches storage; only its hash does.
/// A row is mutated exactly once (revoked, and linked to its successor
/// when revoked by rotation) and is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshSession {
    /// Row identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Hex SHA-256 of the session identifier. Unique.
    pub token_hash: String,
    /// When the session stops authorizing refreshes.
    pub expires_at: DateTime<Utc>,
    /// When the session was revoked by rotation or logout.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Hash of the session identifier that superseded this one.
    pub replaced_by_hash: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl RefreshSession {
    /// Whether the session can authorize a refresh at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    /// Whether the session was superseded by a rotation.
    pub fn is_rotated(&self) -> bool {
        self.replaced_by_hash.is_some()
    }
}

/// Data required to persist a new refresh session.
#[derive(Debug, Clone)]
pub struct NewRefreshSession {
    /// Owning user.
    pub user_id: Uuid,
    /// Hash of the session identifier.
    pub token_hash: String,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}
