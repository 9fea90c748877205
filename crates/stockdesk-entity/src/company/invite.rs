//! Company invitations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An invitation for an email address to join a company with a role.
///
/// Only the SHA-256 hash of the invite token is stored; the raw token is
/// handed to the notifier once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    /// Invite identifier.
    pub id: Uuid,
    /// Inviting company.
    pub company_id: Uuid,
    /// Invited email, lower-cased.
    pub email: String,
    /// Role granted on acceptance.
    pub role_id: Uuid,
    /// Hash of the invite token.
    pub token_hash: String,
    /// Invite expiry.
    pub expires_at: DateTime<Utc>,
    /// When the invite was accepted.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Inviting user.
    pub created_by: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Invite {
    /// Whether the invite can still be accepted at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.accepted_at.is_none() && self.expires_at > now
    }
}

crate::tenant_entity!(Invite, "invites");

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(expires_in: Duration) -> Invite {
        let now = Utc::now();
        Invite {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            email: "clerk@shop.test".to_string(),
            role_id: Uuid::new_v4(),
            token_hash: "abc".to_string(),
            expires_at: now + expires_in,
            accepted_at: None,
            created_by: Uuid::new_v4(),
            created_at: now,
        }
    }

    #[test]
    fn test_open_until_expiry_or_acceptance() {
        let now = Utc::now();
        let mut open = invite(Duration::hours(1));
        assert!(open.is_open(now));

        open.accepted_at = Some(now);
        assert!(!open.is_open(now));

        assert!(!invite(Duration::hours(-1)).is_open(now));
    }
}
