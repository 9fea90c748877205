//! Company creation and membership through invites.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use stockdesk_auth::PermissionEvaluator;
use stockdesk_auth::token::{generate_token, hash_token};
use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{CompanyId, Filter, RoleId};
use stockdesk_database::{AccountStore, RecordStore, TenantContext, TenantRepository};
use stockdesk_entity::company::{Company, CreateCompany, Invite};
use stockdesk_entity::role::{Action, Module, Role};
use stockdesk_entity::user::User;

use super::notifier::InviteNotifier;
use crate::context::RequestContext;
use crate::validation::validate_input;

/// Request to create a company.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompanyInput {
    /// Display name.
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"))]
    pub name: String,
}

/// Request to invite someone into the caller's company.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInviteInput {
    /// Address to invite.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Role granted on acceptance.
    pub role_id: Uuid,
}

/// Request to accept an invite.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AcceptInviteInput {
    /// Company that issued the invite.
    pub company_id: Uuid,
    /// Raw invite token.
    #[validate(length(min = 1, message = "is required"))]
    pub token: String,
}

/// A new company and the owner role given to its creator.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedCompany {
    /// The company.
    pub company: Company,
    /// The creator's role.
    pub role: Role,
}

/// A new invite together with its raw token, returned exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedInvite {
    /// Stored invite.
    pub invite: Invite,
    /// Raw token to hand to the invitee.
    pub token: String,
}

/// Creates companies and manages membership.
#[derive(Debug, Clone)]
pub struct CompanyService {
    accounts: Arc<dyn AccountStore>,
    roles: TenantRepository<Role>,
    invites: TenantRepository<Invite>,
    permissions: PermissionEvaluator,
    notifier: Arc<dyn InviteNotifier>,
    invite_ttl: Duration,
}

impl CompanyService {
    /// Create a new company service.
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        records: Arc<dyn RecordStore>,
        permissions: PermissionEvaluator,
        notifier: Arc<dyn InviteNotifier>,
        invite_ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            roles: TenantRepository::new(records.clone()),
            invites: TenantRepository::new(records),
            permissions,
            notifier,
            invite_ttl,
        }
    }

    /// Create a company owned by the caller.
    ///
    /// The caller's token does not change; the new company and owner role
    /// appear in the access token issued by the next refresh.
    pub async fn create_company(&self, ctx: &RequestContext, input: CreateCompanyInput) -> AppResult<CreatedCompany> {
        validate_input(&input)?;
        let user = self.companyless_user(ctx).await?;

        let company = self
            .accounts
            .create_company(CreateCompany {
                name: input.name.trim().to_string(),
                owner_id: user.id,
            })
            .await?;
        let company_id = CompanyId::from_uuid(company.id);

        let tenant = TenantContext::for_company(company_id);
        let role = self.roles.create(&tenant, &Role::owner(company.id)).await?;
        self.accounts
            .join_company(ctx.user_id, company_id, RoleId::from_uuid(role.id))
            .await?;

        info!(user_id = %user.id, company_id = %company.id, "Company created");
        Ok(CreatedCompany { company, role })
    }

    /// The caller's company.
    pub async fn current(&self, ctx: &RequestContext) -> AppResult<Company> {
        ctx.authorize(&self.permissions, Module::Company, Action::Read).await?;
        let company_id = ctx.require_company()?;
        self.accounts
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::not_found("Company not found"))
    }

    /// Invite an email address into the caller's company.
    pub async fn create_invite(&self, ctx: &RequestContext, input: CreateInviteInput) -> AppResult<CreatedInvite> {
        ctx.authorize(&self.permissions, Module::Company, Action::Invite).await?;
        validate_input(&input)?;
        let company = self.current_company(ctx).await?;
        let tenant = ctx.tenant();

        let role = self.roles.get(&tenant, input.role_id).await?;

        let token = generate_token();
        let now = Utc::now();
        let invite = Invite {
            id: Uuid::now_v7(),
            company_id: company.id,
            email: input.email.trim().to_lowercase(),
            role_id: role.id,
            token_hash: hash_token(&token),
            expires_at: now + self.invite_ttl,
            accepted_at: None,
            created_by: ctx.user_id.into_uuid(),
            created_at: now,
        };
        let invite = self.invites.create(&tenant, &invite).await?;

        if let Err(e) = self.notifier.send_invite(&company, &invite, &token).await {
            warn!(invite_id = %invite.id, error = %e, "Invite notification failed");
        }

        info!(company_id = %company.id, invite_id = %invite.id, role_id = %role.id, "Invite created");
        Ok(CreatedInvite { invite, token })
    }

    /// Join the company named in the input using an invite token.
    ///
    /// The caller has no tenant yet, so the invite is looked up with the
    /// company named explicitly in the filter.
    pub async fn accept_invite(&self, ctx: &RequestContext, input: AcceptInviteInput) -> AppResult<Company> {
        validate_input(&input)?;
        let user = self.companyless_user(ctx).await?;
        let invalid = || AppError::not_found("Invite is invalid or has expired");

        let invite = self
            .invites
            .find_one(
                &TenantContext::detached(),
                Filter::new()
                    .eq("company_id", input.company_id)
                    .eq("token_hash", hash_token(&input.token)),
            )
            .await?
            .ok_or_else(invalid)?;

        let now = Utc::now();
        if !invite.is_open(now) {
            return Err(invalid());
        }
        if !invite.email.eq_ignore_ascii_case(&user.email) {
            warn!(user_id = %user.id, invite_id = %invite.id, "Invite presented by a different account");
            return Err(AppError::forbidden("This invite was issued to a different email address"));
        }

        let company_id = CompanyId::from_uuid(invite.company_id);
        let tenant = TenantContext::for_company(company_id);
        if self.roles.find_by_id(&tenant, invite.role_id).await?.is_none() {
            return Err(AppError::conflict("The invited role no longer exists"));
        }

        let company = self
            .accounts
            .find_company(company_id)
            .await?
            .ok_or_else(invalid)?;

        // Join first: a failed join must leave the invite open.
        self.accounts
            .join_company(ctx.user_id, company_id, RoleId::from_uuid(invite.role_id))
            .await?;

        let mut patch = Map::new();
        patch.insert("accepted_at".to_string(), json!(now));
        self.invites.update(&tenant, invite.id, patch).await?;

        info!(user_id = %user.id, company_id = %company.id, "Invite accepted");
        Ok(company)
    }

    async fn current_company(&self, ctx: &RequestContext) -> AppResult<Company> {
        self.accounts
            .find_company(ctx.require_company()?)
            .await?
            .ok_or_else(|| AppError::not_found("Company not found"))
    }

    /// The stored caller, who must not belong to a company yet. The token
    /// may be stale, so the stored record decides.
    async fn companyless_user(&self, ctx: &RequestContext) -> AppResult<User> {
        let user = self
            .accounts
            .find_user(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if user.has_company() {
            return Err(AppError::conflict("User already belongs to a company"));
        }
        Ok(user)
    }
}
