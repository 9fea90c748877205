//! In-memory backend for tests and local development.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{CompanyId, RoleId, UserId};
use stockdesk_entity::company::{Company, CreateCompany};
use stockdesk_entity::session::{NewRefreshSession, RefreshSession};
use stockdesk_entity::user::{CreateUser, User};

use super::{AccountStore, RecordStore, RefreshSessionStore, normalize_email};
use crate::query::FindOptions;
use crate::query::eval;
use crate::tenant::{ScopedDelete, ScopedDocument, ScopedFilter, ScopedPipeline, ScopedUpdate};

#[derive(Debug, Default)]
struct AccountState {
    users: HashMap<Uuid, User>,
    companies: BTreeMap<Uuid, Company>,
}

/// Implements every storage trait on process memory.
///
/// Documents are kept per collection, keyed by id. Refresh sessions live
/// behind one mutex so a rotation's two writes are applied together.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<&'static str, BTreeMap<Uuid, Value>>,
    accounts: RwLock<AccountState>,
    sessions: Mutex<HashMap<String, RefreshSession>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(&self, filter: &ScopedFilter) -> Vec<Value> {
        self.collections
            .get(filter.collection())
            .map(|docs| docs.values().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, document: ScopedDocument) -> AppResult<()> {
        let collection = document.collection();
        let id = document.id();
        let mut docs = self.collections.entry(collection).or_default();
        if docs.contains_key(&id) {
            return Err(AppError::conflict(format!("{collection} record {id} already exists")));
        }
        docs.insert(id, document.into_document());
        Ok(())
    }

    async fn find(&self, filter: &ScopedFilter, options: &FindOptions) -> AppResult<Vec<Value>> {
        let mut docs = self.matching(filter);
        eval::sort_documents(&mut docs, &options.sort);
        let limit = options.limit.map_or(usize::MAX, |l| l as usize);
        Ok(docs
            .into_iter()
            .skip(usize::try_from(options.offset).unwrap_or(usize::MAX))
            .take(limit)
            .collect())
    }

    async fn count(&self, filter: &ScopedFilter) -> AppResult<u64> {
        Ok(self.matching(filter).len() as u64)
    }

    async fn update(&self, update: ScopedUpdate) -> AppResult<u64> {
        let filter = update.filter();
        let Some(mut docs) = self.collections.get_mut(filter.collection()) else {
            return Ok(0);
        };
        let mut updated = 0;
        for doc in docs.values_mut().filter(|d| filter.matches(d)) {
            if let Value::Object(fields) = doc {
                for (key, value) in update.patch() {
                    fields.insert(key.clone(), value.clone());
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, delete: ScopedDelete) -> AppResult<u64> {
        let filter = delete.filter();
        let Some(mut docs) = self.collections.get_mut(filter.collection()) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }

    async fn aggregate(&self, pipeline: &ScopedPipeline) -> AppResult<Vec<Value>> {
        let docs = self.matching(pipeline.scope());
        Ok(eval::run_stages(docs, pipeline.stages()))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        let email = normalize_email(&data.email);
        let mut state = self.accounts.write().await;
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::conflict("Email is already registered"));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email,
            password_hash: data.password_hash,
            name: data.name,
            company_id: None,
            role_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.accounts.read().await.users.get(id.as_uuid()).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = normalize_email(email);
        let state = self.accounts.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn join_company(&self, user_id: UserId, company_id: CompanyId, role_id: RoleId) -> AppResult<User> {
        let mut state = self.accounts.write().await;
        let user = state
            .users
            .get_mut(user_id.as_uuid())
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if user.company_id.is_some() {
            return Err(AppError::conflict("User already belongs to a company"));
        }
        user.company_id = Some(company_id.into_uuid());
        user.role_id = Some(role_id.into_uuid());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_role(&self, user_id: UserId, company_id: CompanyId, role_id: RoleId) -> AppResult<bool> {
        let mut state = self.accounts.write().await;
        match state.users.get_mut(user_id.as_uuid()) {
            Some(user) if user.company_id == Some(company_id.into_uuid()) => {
                user.role_id = Some(role_id.into_uuid());
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_company(&self, data: CreateCompany) -> AppResult<Company> {
        let company = Company {
            id: Uuid::now_v7(),
            name: data.name,
            owner_id: data.owner_id,
            created_at: Utc::now(),
        };
        self.accounts
            .write()
            .await
            .companies
            .insert(company.id, company.clone());
        Ok(company)
    }

    async fn find_company(&self, id: CompanyId) -> AppResult<Option<Company>> {
        Ok(self.accounts.read().await.companies.get(id.as_uuid()).cloned())
    }

    async fn list_company_ids(&self) -> AppResult<Vec<CompanyId>> {
        let state = self.accounts.read().await;
        Ok(state.companies.keys().copied().map(CompanyId::from_uuid).collect())
    }
}

#[async_trait]
impl RefreshSessionStore for MemoryStore {
    async fn create(&self, data: NewRefreshSession) -> AppResult<RefreshSession> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&data.token_hash) {
            return Err(AppError::conflict("Refresh session hash collision"));
        }
        let session = new_session(data);
        sessions.insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshSession>> {
        Ok(self.sessions.lock().await.get(token_hash).cloned())
    }

    async fn rotate(
        &self,
        current_hash: &str,
        successor: NewRefreshSession,
        now: DateTime<Utc>,
    ) -> AppResult<Option<RefreshSession>> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&successor.token_hash) {
            return Err(AppError::conflict("Refresh session hash collision"));
        }
        let Some(current) = sessions.get_mut(current_hash).filter(|s| s.is_active(now)) else {
            return Ok(None);
        };
        current.revoked_at = Some(now);
        current.replaced_by_hash = Some(successor.token_hash.clone());

        let next = new_session(successor);
        sessions.insert(next.token_hash.clone(), next.clone());
        Ok(Some(next))
    }

    async fn revoke(&self, token_hash: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(token_hash) {
            Some(session) if session.revoked_at.is_none() => {
                session.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RefreshSession>> {
        let sessions = self.sessions.lock().await;
        let mut owned: Vec<RefreshSession> = sessions
            .values()
            .filter(|s| s.user_id == user_id.into_uuid())
            .cloned()
            .collect();
        owned.sort_by_key(|s| (s.created_at, s.id));
        Ok(owned)
    }
}

fn new_session(data: NewRefreshSession) -> RefreshSession {
    RefreshSession {
        id: Uuid::now_v7(),
        user_id: data.user_id,
        token_hash: data.token_hash,
        expires_at: data.expires_at,
        revoked_at: None,
        replaced_by_hash: None,
        created_at: Utc::now(),
    }
}
