//! Request context carrying the authenticated user and their tenant.

use chrono::{DateTime, Utc};

use stockdesk_auth::{AccessClaims, PermissionEvaluator};
use stockdesk_core::error::AppError;
use stockdesk_core::types::{CompanyId, RoleId, UserId};
use stockdesk_database::TenantContext;
use stockdesk_entity::role::{Action, Module};

/// Context for the current authenticated request.
///
/// Built by the authentication extractor from verified access-token
/// claims and passed into every service method.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The authenticated user.
    pub user_id: UserId,
    /// The user's email (from the token).
    pub email: String,
    /// Company claimed by the token.
    pub company_id: Option<CompanyId>,
    /// Role claimed by the token.
    pub role_id: Option<RoleId>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Context from verified access-token claims.
    pub fn from_claims(claims: &AccessClaims) -> Self {
        Self {
            user_id: claims.user_id(),
            email: claims.email.clone(),
            company_id: claims.company(),
            role_id: claims.role(),
            request_time: Utc::now(),
        }
    }

    /// Tenant context for data access during this request.
    pub fn tenant(&self) -> TenantContext {
        TenantContext::for_request(self.user_id, self.company_id)
    }

    /// The caller's company, or `Forbidden` if they have none.
    pub fn require_company(&self) -> Result<CompanyId, AppError> {
        self.company_id
            .ok_or_else(|| AppError::forbidden("Join or create a company first"))
    }

    /// Ask the evaluator whether the caller's role allows `action` on `module`.
    pub async fn authorize(
        &self,
        permissions: &PermissionEvaluator,
        module: Module,
        action: Action,
    ) -> Result<(), AppError> {
        permissions
            .require(self.company_id, self.role_id, module, action)
            .await
    }
}
