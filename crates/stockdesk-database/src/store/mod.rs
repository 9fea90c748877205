//! Storage traits and backend selection.
//!
//! Three narrow traits cover everything StockDesk persists:
//!
//! - [`RecordStore`]: tenant-owned JSON documents. Methods accept only the
//!   scoped types produced by [`crate::tenant::TenantGuard`].
//! - [`AccountStore`]: users and companies, which exist above tenants.
//! - [`RefreshSessionStore`]: refresh sessions, owned by the session manager.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use stockdesk_core::config::DatabaseConfig;
use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{CompanyId, RoleId, UserId};
use stockdesk_entity::company::{Company, CreateCompany};
use stockdesk_entity::session::{NewRefreshSession, RefreshSession};
use stockdesk_entity::user::{CreateUser, User};

use crate::connection::DatabasePool;
use crate::query::FindOptions;
use crate::tenant::{ScopedDelete, ScopedDocument, ScopedFilter, ScopedPipeline, ScopedUpdate};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence for tenant-owned documents.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a document. `Conflict` if the id already exists.
    async fn insert(&self, document: ScopedDocument) -> AppResult<()>;

    /// Documents matching the filter.
    async fn find(&self, filter: &ScopedFilter, options: &FindOptions) -> AppResult<Vec<Value>>;

    /// Number of documents matching the filter.
    async fn count(&self, filter: &ScopedFilter) -> AppResult<u64>;

    /// Overwrite top-level fields of matching documents. Returns the number updated.
    async fn update(&self, update: ScopedUpdate) -> AppResult<u64>;

    /// Delete matching documents. Returns the number deleted.
    async fn delete(&self, delete: ScopedDelete) -> AppResult<u64>;

    /// Run an aggregation pipeline.
    async fn aggregate(&self, pipeline: &ScopedPipeline) -> AppResult<Vec<Value>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Persistence for users and companies.
#[async_trait]
pub trait AccountStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create a user. `Conflict` if the email is taken.
    async fn create_user(&self, data: CreateUser) -> AppResult<User>;

    /// Find a user by id.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by (case-insensitive) email.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Attach a user without a company to `company_id` with `role_id`.
    /// `Conflict` if the user already belongs to a company.
    async fn join_company(&self, user_id: UserId, company_id: CompanyId, role_id: RoleId) -> AppResult<User>;

    /// Change a member's role within their current company.
    async fn set_role(&self, user_id: UserId, company_id: CompanyId, role_id: RoleId) -> AppResult<bool>;

    /// Create a company.
    async fn create_company(&self, data: CreateCompany) -> AppResult<Company>;

    /// Find a company by id.
    async fn find_company(&self, id: CompanyId) -> AppResult<Option<Company>>;

    /// Every company id, for jobs that iterate tenants.
    async fn list_company_ids(&self) -> AppResult<Vec<CompanyId>>;
}

/// Persistence for refresh sessions.
#[async_trait]
pub trait RefreshSessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new session.
    async fn create(&self, data: NewRefreshSession) -> AppResult<RefreshSession>;

    /// Find a session by the hash of its identifier.
    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>>;

    /// Revoke the active session `current_hash`, link it to the successor,
    /// and insert the successor, as one atomic step.
    ///
    /// Returns `None`, with nothing written, when `current_hash` is not an
    /// unrevoked, unexpired session at `now` (including when a concurrent
    /// rotation claimed it first).
    async fn rotate(
        &self,
        current_hash: &str,
        successor: NewRefreshSession,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RefreshSession>>;

    /// Revoke a session if it is still unrevoked. Returns whether a row changed.
    async fn revoke(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<bool>;

    /// All sessions of a user, oldest first.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RefreshSession>>;
}

/// The configured backends.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Tenant-owned documents.
    pub records: Arc<dyn RecordStore>,
    /// Users and companies.
    pub accounts: Arc<dyn AccountStore>,
    /// Refresh sessions.
    pub sessions: Arc<dyn RefreshSessionStore>,
}

impl Stores {
    /// Connect the backend named by `database.provider`.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "postgres" => {
                let pool = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    pool.migrate().await?;
                }
                Ok(Self::from_backend(Arc::new(PgStore::new(pool))))
            }
            "memory" => {
                info!("Using in-memory storage; data is lost on restart");
                Ok(Self::memory())
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: postgres, memory"
            ))),
        }
    }

    /// Fresh in-memory backends.
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    /// Use one backend for all three traits.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: RecordStore + AccountStore + RefreshSessionStore,
    {
        Self {
            records: backend.clone(),
            accounts: backend.clone(),
            sessions: backend,
        }
    }
}

/// Normalize an email for storage and lookup.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
