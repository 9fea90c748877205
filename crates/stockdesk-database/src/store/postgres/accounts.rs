//! Users and companies.

use async_trait::async_trait;

use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{CompanyId, RoleId, UserId};
use stockdesk_entity::company::{Company, CreateCompany};
use stockdesk_entity::user::{CreateUser, User};

use super::{PgStore, db_error};
use crate::store::{AccountStore, normalize_email};

#[async_trait]
impl AccountStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, name) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(UserId::new())
        .bind(normalize_email(&data.email))
        .bind(&data.password_hash)
        .bind(&data.name)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            let err = db_error("Failed to create user")(e);
            if err.is(stockdesk_core::ErrorKind::Conflict) {
                AppError::conflict("Email is already registered")
            } else {
                err
            }
        })
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find user"))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find user by email"))
    }

    async fn join_company(&self, user_id: UserId, company_id: CompanyId, role_id: RoleId) -> AppResult<User> {
        let joined = sqlx::query_as::<_, User>(
            "UPDATE users SET company_id = $2, role_id = $3, updated_at = NOW() \
             WHERE id = $1 AND company_id IS NULL RETURNING *",
        )
        .bind(user_id)
        .bind(company_id)
        .bind(role_id)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to join company"))?;

        match joined {
            Some(user) => Ok(user),
            None if self.find_user(user_id).await?.is_some() => {
                Err(AppError::conflict("User already belongs to a company"))
            }
            None => Err(AppError::not_found("User not found")),
        }
    }

    async fn set_role(&self, user_id: UserId, company_id: CompanyId, role_id: RoleId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET role_id = $3, updated_at = NOW() WHERE id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .bind(role_id)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to set role"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn create_company(&self, data: CreateCompany) -> AppResult<Company> {
        sqlx::query_as::<_, Company>(
            "INSERT INTO companies (id, name, owner_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(CompanyId::new())
        .bind(&data.name)
        .bind(data.owner_id)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to create company"))
    }

    async fn find_company(&self, id: CompanyId) -> AppResult<Option<Company>> {
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find company"))
    }

    async fn list_company_ids(&self) -> AppResult<Vec<CompanyId>> {
        sqlx::query_scalar::<_, CompanyId>("SELECT id FROM companies ORDER BY id")
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list companies"))
    }
}
