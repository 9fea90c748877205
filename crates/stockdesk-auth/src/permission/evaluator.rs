//! Permission checks: `(tenant, role, module, action) -> allow/deny`.

use std::sync::Arc;

use tracing::debug;

use stockdesk_core::error::AppError;
use stockdesk_core::types::{CompanyId, RoleId};
use stockdesk_database::{RecordStore, TenantContext, TenantRepository};
use stockdesk_entity::role::{Action, Module, Role};

/// Resolves a member's role and checks it against a module/action pair.
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    roles: TenantRepository<Role>,
}

impl PermissionEvaluator {
    /// Create an evaluator reading roles from `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            roles: TenantRepository::new(store),
        }
    }

    /// Whether `role_id` in `company_id` may perform `action` on `module`.
    ///
    /// A role that does not exist in the company denies.
    pub async fn is_allowed(
        &self,
        company_id: CompanyId,
        role_id: RoleId,
        module: Module,
        action: Action,
    ) -> Result<bool, AppError> {
        let ctx = TenantContext::for_company(company_id);
        let allowed = self
            .roles
            .find_by_id(&ctx, role_id.into_uuid())
            .await?
            .is_some_and(|role| role.allows(module, action));

        debug!(
            company_id = %company_id,
            role_id = %role_id,
            module = %module,
            action = %action,
            allowed,
            "Permission evaluated"
        );
        Ok(allowed)
    }

    /// Like [`Self::is_allowed`], but `Forbidden` on deny. Callers without
    /// a company or role are always denied.
    pub async fn require(
        &self,
        company_id: Option<CompanyId>,
        role_id: Option<RoleId>,
        module: Module,
        action: Action,
    ) -> Result<(), AppError> {
        let (Some(company_id), Some(role_id)) = (company_id, role_id) else {
            return Err(AppError::forbidden("Join or create a company first"));
        };
        if self.is_allowed(company_id, role_id, module, action).await? {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Your role does not allow '{action}' on '{module}'"
            )))
        }
    }
}
