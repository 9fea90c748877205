//! Role entity model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::{Action, Module, ModuleAccess};

/// A named set of module grants within one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Display name, unique within the company.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Grants keyed by module. Missing modules grant nothing.
    #[serde(default)]
    pub permissions: BTreeMap<Module, ModuleAccess>,
    /// Owner roles bypass per-module grants.
    #[serde(default)]
    pub full_access: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// The role given to the user who creates a company.
    pub fn owner(company_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            company_id,
            name: "Owner".to_string(),
            description: Some("Full access to every module".to_string()),
            permissions: Module::ALL
                .into_iter()
                .map(|m| (m, ModuleAccess::full([Action::Invite, Action::Import, Action::Sync])))
                .collect(),
            full_access: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this role permits `action` on `module`.
    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.full_access
            || self
                .permissions
                .get(&module)
                .is_some_and(|access| access.allows(action))
    }
}

crate::tenant_entity!(Role, "roles");
