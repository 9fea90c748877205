//! Role management within the caller's company.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, json};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use stockdesk_auth::PermissionEvaluator;
use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{Filter, RoleId, SortField, UserId};
use stockdesk_database::query::FindOptions;
use stockdesk_database::{AccountStore, RecordStore, TenantRepository};
use stockdesk_entity::role::{Action, Module, ModuleAccess, Role};

use crate::context::RequestContext;
use crate::validation::validate_input;

/// Request to create a role.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleInput {
    /// Display name, unique within the company.
    #[validate(length(min = 1, max = 60, message = "must be 1-60 characters"))]
    pub name: String,
    /// Optional description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Grants keyed by module.
    #[serde(default)]
    pub permissions: BTreeMap<Module, ModuleAccess>,
}

/// Request to change a role. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRoleInput {
    /// New name.
    #[validate(length(min = 1, max = 60, message = "must be 1-60 characters"))]
    pub name: Option<String>,
    /// New description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Replacement grants.
    pub permissions: Option<BTreeMap<Module, ModuleAccess>>,
}

/// Request to give a member a role.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignRoleInput {
    /// Member receiving the role.
    pub user_id: Uuid,
}

/// Creates, edits, and assigns roles.
#[derive(Debug, Clone)]
pub struct RoleService {
    roles: TenantRepository<Role>,
    accounts: Arc<dyn AccountStore>,
    permissions: PermissionEvaluator,
}

impl RoleService {
    /// Create a new role service.
    pub fn new(records: Arc<dyn RecordStore>, accounts: Arc<dyn AccountStore>, permissions: PermissionEvaluator) -> Self {
        Self {
            roles: TenantRepository::new(records),
            accounts,
            permissions,
        }
    }

    /// Every role of the caller's company, by name.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<Role>> {
        ctx.authorize(&self.permissions, Module::Roles, Action::Read).await?;
        self.roles
            .find(&ctx.tenant(), Filter::new(), &FindOptions::sorted(vec![SortField::asc("name")]))
            .await
    }

    /// One role.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Role> {
        ctx.authorize(&self.permissions, Module::Roles, Action::Read).await?;
        self.roles.get(&ctx.tenant(), id).await
    }

    /// Create a role.
    pub async fn create(&self, ctx: &RequestContext, input: CreateRoleInput) -> AppResult<Role> {
        ctx.authorize(&self.permissions, Module::Roles, Action::Create).await?;
        validate_input(&input)?;
        let name = input.name.trim().to_string();
        self.ensure_name_free(ctx, &name, None).await?;

        let now = Utc::now();
        let role = Role {
            id: Uuid::now_v7(),
            company_id: Uuid::nil(),
            name,
            description: input.description,
            permissions: input.permissions,
            full_access: false,
            created_at: now,
            updated_at: now,
        };
        let role = self.roles.create(&ctx.tenant(), &role).await?;
        info!(role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    /// Change a role's name, description, or grants.
    pub async fn update(&self, ctx: &RequestContext, id: Uuid, input: UpdateRoleInput) -> AppResult<Role> {
        ctx.authorize(&self.permissions, Module::Roles, Action::Update).await?;
        validate_input(&input)?;

        let mut patch = Map::new();
        if let Some(name) = input.name {
            let name = name.trim().to_string();
            self.ensure_name_free(ctx, &name, Some(id)).await?;
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(description) = input.description {
            patch.insert("description".to_string(), json!(description));
        }
        if let Some(permissions) = input.permissions {
            patch.insert("permissions".to_string(), serde_json::to_value(permissions)?);
        }
        patch.insert("updated_at".to_string(), json!(Utc::now()));

        self.roles
            .update(&ctx.tenant(), id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {id} not found")))
    }

    /// Delete a role. The owner role cannot be deleted.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        ctx.authorize(&self.permissions, Module::Roles, Action::Delete).await?;
        let tenant = ctx.tenant();
        let role = self.roles.get(&tenant, id).await?;
        if role.full_access {
            return Err(AppError::conflict("The owner role cannot be deleted"));
        }
        if !self.roles.delete(&tenant, id).await? {
            return Err(AppError::not_found(format!("Role {id} not found")));
        }
        info!(role_id = %id, "Role deleted");
        Ok(())
    }

    /// Give a member of the caller's company the role `id`.
    pub async fn assign(&self, ctx: &RequestContext, id: Uuid, input: AssignRoleInput) -> AppResult<()> {
        ctx.authorize(&self.permissions, Module::Roles, Action::Update).await?;
        let company_id = ctx.require_company()?;
        let tenant = ctx.tenant();
        let role = self.roles.get(&tenant, id).await?;

        // Granting or revoking full access takes full access.
        if (role.full_access || self.member_has_full_access(ctx, input.user_id).await?)
            && !self.caller_has_full_access(ctx).await?
        {
            return Err(AppError::forbidden("Only an owner can grant or revoke the owner role"));
        }

        let changed = self
            .accounts
            .set_role(UserId::from_uuid(input.user_id), company_id, RoleId::from_uuid(role.id))
            .await?;
        if !changed {
            return Err(AppError::not_found("User is not a member of this company"));
        }
        info!(user_id = %input.user_id, role_id = %role.id, "Role assigned");
        Ok(())
    }

    async fn caller_has_full_access(&self, ctx: &RequestContext) -> AppResult<bool> {
        let Some(role_id) = ctx.role_id else {
            return Ok(false);
        };
        let role = self.roles.find_by_id(&ctx.tenant(), role_id.into_uuid()).await?;
        Ok(role.is_some_and(|r| r.full_access))
    }

    async fn member_has_full_access(&self, ctx: &RequestContext, user_id: Uuid) -> AppResult<bool> {
        let member = self.accounts.find_user(UserId::from_uuid(user_id)).await?;
        let Some(role_id) = member
            .filter(|m| m.company_id == ctx.company_id.map(|c| c.into_uuid()))
            .and_then(|m| m.role_id)
        else {
            return Ok(false);
        };
        let role = self.roles.find_by_id(&ctx.tenant(), role_id).await?;
        Ok(role.is_some_and(|r| r.full_access))
    }

    async fn ensure_name_free(&self, ctx: &RequestContext, name: &str, except: Option<Uuid>) -> AppResult<()> {
        let existing = self
            .roles
            .find_one(&ctx.tenant(), Filter::new().eq("name", name))
            .await?;
        match existing {
            Some(role) if Some(role.id) != except => {
                Err(AppError::conflict(format!("A role named '{name}' already exists")))
            }
            _ => Ok(()),
        }
    }
}
