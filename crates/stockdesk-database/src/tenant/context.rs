//! Request-scoped tenant context.

use std::fmt;

use stockdesk_core::types::{CompanyId, UserId};

/// The tenant and user a unit of work runs for.
///
/// Each request builds its own value after authentication and drops it
/// when the request ends. There is no global or task-local copy: the
/// context is an argument of every tenant-scoped data access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    company_id: Option<CompanyId>,
    user_id: Option<UserId>,
}

impl TenantContext {
    /// Context of an authenticated request. `company_id` is `None` for
    /// users that have not created or joined a company yet.
    pub fn for_request(user_id: UserId, company_id: Option<CompanyId>) -> Self {
        Self {
            company_id,
            user_id: Some(user_id),
        }
    }

    /// Context of a background job iteration over one company.
    pub fn for_company(company_id: CompanyId) -> Self {
        Self {
            company_id: Some(company_id),
            user_id: None,
        }
    }

    /// Context with no ambient tenant. Every operation run under it must
    /// name its company explicitly.
    pub fn detached() -> Self {
        Self {
            company_id: None,
            user_id: None,
        }
    }

    /// Ambient tenant, if any.
    pub fn company_id(&self) -> Option<CompanyId> {
        self.company_id
    }

    /// Acting user, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Whether an ambient tenant is set.
    pub fn has_tenant(&self) -> bool {
        self.company_id.is_some()
    }
}

impl fmt::Display for TenantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.company_id {
            Some(company) => write!(f, "company:{company}"),
            None => f.write_str("company:<none>"),
        }
    }
}
