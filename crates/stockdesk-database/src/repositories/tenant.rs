//! Repository for tenant-scoped entities.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use stockdesk_core::error::AppError;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{Filter, PageRequest, PageResponse, SortField};
use stockdesk_entity::TenantEntity;

use crate::query::{FindOptions, Pipeline};
use crate::store::RecordStore;
use crate::tenant::{TenantContext, TenantGuard};

/// CRUD and aggregation for one entity type.
///
/// Every method takes the caller's [`TenantContext`] and routes the
/// operation through [`TenantGuard`] before touching storage.
pub struct TenantRepository<E> {
    store: Arc<dyn RecordStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for TenantRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: TenantEntity> fmt::Debug for TenantRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantRepository")
            .field("collection", &E::COLLECTION)
            .finish()
    }
}

impl<E: TenantEntity> TenantRepository<E> {
    /// Create a repository over a record store.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Insert an entity. Its `company_id` is filled from `ctx` when unset.
    pub async fn create(&self, ctx: &TenantContext, entity: &E) -> AppResult<E> {
        let document = TenantGuard::scope_insert(ctx, entity)?;
        let stored = document.document().clone();
        self.store.insert(document).await?;
        decode(stored)
    }

    /// Find an entity by id.
    pub async fn find_by_id(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Option<E>> {
        self.find_one(ctx, by_id(id)).await
    }

    /// Find an entity by id, or `NotFound`.
    pub async fn get(&self, ctx: &TenantContext, id: Uuid) -> AppResult<E> {
        self.find_by_id(ctx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} record {id} not found", E::COLLECTION)))
    }

    /// First entity matching `filter`.
    pub async fn find_one(&self, ctx: &TenantContext, filter: Filter) -> AppResult<Option<E>> {
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        Ok(self.find(ctx, filter, &options).await?.into_iter().next())
    }

    /// Entities matching `filter`.
    pub async fn find(&self, ctx: &TenantContext, filter: Filter, options: &FindOptions) -> AppResult<Vec<E>> {
        let scoped = TenantGuard::scope_filter::<E>(ctx, filter)?;
        self.store
            .find(&scoped, options)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// One page of entities matching `filter`.
    pub async fn find_page(
        &self,
        ctx: &TenantContext,
        filter: Filter,
        sort: Vec<SortField>,
        page: PageRequest,
    ) -> AppResult<PageResponse<E>> {
        let page = page.normalized();
        let scoped = TenantGuard::scope_filter::<E>(ctx, filter)?;
        let total = self.store.count(&scoped).await?;
        let options = FindOptions {
            sort,
            limit: Some(page.limit()),
            offset: page.offset(),
        };
        let items = self
            .store
            .find(&scoped, &options)
            .await?
            .into_iter()
            .map(decode)
            .collect::<AppResult<Vec<E>>>()?;
        Ok(PageResponse::new(items, page, total))
    }

    /// Number of entities matching `filter`.
    pub async fn count(&self, ctx: &TenantContext, filter: Filter) -> AppResult<u64> {
        let scoped = TenantGuard::scope_filter::<E>(ctx, filter)?;
        self.store.count(&scoped).await
    }

    /// Overwrite fields of one entity and return it, or `None` if no
    /// entity with `id` exists in the caller's tenant.
    pub async fn update(&self, ctx: &TenantContext, id: Uuid, patch: Map<String, Value>) -> AppResult<Option<E>> {
        let scoped = TenantGuard::scope_update::<E>(ctx, by_id(id), patch)?;
        if self.store.update(scoped).await? == 0 {
            return Ok(None);
        }
        self.find_by_id(ctx, id).await
    }

    /// Delete one entity. Returns whether it existed in the caller's tenant.
    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AppResult<bool> {
        let scoped = TenantGuard::scope_delete::<E>(ctx, by_id(id))?;
        Ok(self.store.delete(scoped).await? > 0)
    }

    /// Delete every entity matching `filter`. Returns the number deleted.
    pub async fn delete_many(&self, ctx: &TenantContext, filter: Filter) -> AppResult<u64> {
        let scoped = TenantGuard::scope_delete::<E>(ctx, filter)?;
        self.store.delete(scoped).await
    }

    /// Run an aggregation over the collection.
    pub async fn aggregate(&self, ctx: &TenantContext, pipeline: Pipeline) -> AppResult<Vec<Value>> {
        let scoped = TenantGuard::scope_pipeline::<E>(ctx, pipeline)?;
        self.store.aggregate(&scoped).await
    }
}

fn by_id(id: Uuid) -> Filter {
    Filter::new().eq("id", id)
}

fn decode<E: TenantEntity>(document: Value) -> AppResult<E> {
    serde_json::from_value(document).map_err(|e| {
        AppError::internal(format!("Stored {} document is malformed: {e}", E::COLLECTION))
    })
}
