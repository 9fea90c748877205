//! Invite delivery.

use async_trait::async_trait;
use tracing::info;

use stockdesk_core::result::AppResult;
use stockdesk_entity::company::{Company, Invite};

/// Delivers a freshly created invite to the invited address.
#[async_trait]
pub trait InviteNotifier: Send + Sync + std::fmt::Debug + 'static {
    /// Send `token` to `invite.email`. The token is the only copy of the
    /// raw credential outside the API response.
    async fn send_invite(&self, company: &Company, invite: &Invite, token: &str) -> AppResult<()>;
}

/// Notifier that only records the invite in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl InviteNotifier for LogNotifier {
    async fn send_invite(&self, company: &Company, invite: &Invite, _token: &str) -> AppResult<()> {
        info!(
            company_id = %company.id,
            invite_id = %invite.id,
            email = %invite.email,
            expires_at = %invite.expires_at,
            "Invite ready for delivery"
        );
        Ok(())
    }
}
