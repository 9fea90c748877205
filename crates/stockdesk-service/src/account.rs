//! Registration and profile lookups.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use stockdesk_auth::{IssuedSession, PasswordHasher, PasswordValidator, SessionManager};
use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::CompanyId;
use stockdesk_database::AccountStore;
use stockdesk_entity::company::Company;
use stockdesk_entity::user::{CreateUser, User};

use crate::context::RequestContext;
use crate::validation::validate_input;

/// Sign-up request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterInput {
    /// Login email.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Plain-text password, checked against the password policy.
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
    /// Display name.
    #[validate(length(min = 1, max = 120, message = "must be 1-120 characters"))]
    pub name: String,
}

/// The caller's user record and company, if any.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    /// Stored user.
    pub user: User,
    /// Company the user belongs to.
    pub company: Option<Company>,
}

/// Creates accounts and reads profiles.
#[derive(Debug, Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<SessionManager>,
    policy: PasswordValidator,
    hasher: PasswordHasher,
}

impl AccountService {
    /// Create a new account service.
    pub fn new(accounts: Arc<dyn AccountStore>, sessions: Arc<SessionManager>, policy: PasswordValidator) -> Self {
        Self {
            accounts,
            sessions,
            policy,
            hasher: PasswordHasher::new(),
        }
    }

    /// Create a user without a company and issue their first session.
    pub async fn register(&self, input: RegisterInput) -> AppResult<IssuedSession> {
        validate_input(&input)?;
        let email = input.email.trim().to_lowercase();
        self.policy
            .validate(&input.password, &[email.as_str(), input.name.as_str()])?;

        let user = self
            .accounts
            .create_user(CreateUser {
                email,
                password_hash: self.hasher.hash_password(&input.password)?,
                name: input.name.trim().to_string(),
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        self.sessions.issue_session(&user).await
    }

    /// The caller's stored profile.
    pub async fn profile(&self, ctx: &RequestContext) -> AppResult<Profile> {
        let user = self
            .accounts
            .find_user(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let company = match user.company_id {
            Some(id) => self.accounts.find_company(CompanyId::from_uuid(id)).await?,
            None => None,
        };
        Ok(Profile { user, company })
    }
}
