//! Provider credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OAuth access token for a provider. Write-only through the API.
#[derive(Clone, Serialize, Deserialize)]
pub struct IntegrationSecret {
    /// Secret identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Provider key.
    pub provider: String,
    /// Bearer token presented to the provider.
    pub access_token: String,
    /// Token expiry, when the provider reports one.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl IntegrationSecret {
    /// Whether the token is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl std::fmt::Debug for IntegrationSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationSecret")
            .field("id", &self.id)
            .field("company_id", &self.company_id)
            .field("provider", &self.provider)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

crate::tenant_entity!(IntegrationSecret, "integration_secrets");
