//! Tenant isolation through the repository layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use stockdesk_core::ErrorKind;
use stockdesk_core::result::AppResult;
use stockdesk_core::types::{CompanyId, Filter, FilterOp, FilterValue, PageRequest, SortField, UserId};
use stockdesk_database::query::{Accumulator, FindOptions, Pipeline};
use stockdesk_database::store::MemoryStore;
use stockdesk_database::tenant::{ScopedDelete, ScopedDocument, ScopedFilter, ScopedPipeline, ScopedUpdate};
use stockdesk_database::{RecordStore, TenantContext, TenantRepository};
use stockdesk_entity::inventory::{Item, LedgerEntry, LedgerReason};

/// Counts every call that reaches storage.
#[derive(Debug, Default)]
struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn insert(&self, document: ScopedDocument) -> AppResult<()> {
        self.hit();
        self.inner.insert(document).await
    }

    async fn find(&self, filter: &ScopedFilter, options: &FindOptions) -> AppResult<Vec<Value>> {
        self.hit();
        self.inner.find(filter, options).await
    }

    async fn count(&self, filter: &ScopedFilter) -> AppResult<u64> {
        self.hit();
        self.inner.count(filter).await
    }

    async fn update(&self, update: ScopedUpdate) -> AppResult<u64> {
        self.hit();
        self.inner.update(update).await
    }

    async fn delete(&self, delete: ScopedDelete) -> AppResult<u64> {
        self.hit();
        self.inner.delete(delete).await
    }

    async fn aggregate(&self, pipeline: &ScopedPipeline) -> AppResult<Vec<Value>> {
        self.hit();
        self.inner.aggregate(pipeline).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

fn item(sku: &str) -> Item {
    let now = Utc::now();
    Item {
        id: Uuid::now_v7(),
        company_id: Uuid::nil(),
        sku: sku.to_string(),
        name: format!("Item {sku}"),
        unit: "each".to_string(),
        price_cents: 250,
        reorder_level: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn entry(item_id: Uuid, location_id: Uuid, delta: i64) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::now_v7(),
        company_id: Uuid::nil(),
        item_id,
        location_id,
        quantity_delta: delta,
        reason: LedgerReason::Receipt,
        reference: None,
        corrects_entry_id: None,
        created_by: None,
        created_at: Utc::now(),
    }
}

fn ctx(company: CompanyId) -> TenantContext {
    TenantContext::for_request(UserId::new(), Some(company))
}

fn patch(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn test_reads_are_partitioned_by_company() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let items = TenantRepository::<Item>::new(store);
    let (a, b) = (CompanyId::new(), CompanyId::new());

    let milk = items.create(&ctx(a), &item("MILK")).await.unwrap();
    items.create(&ctx(b), &item("BREAD")).await.unwrap();

    assert_eq!(milk.company_id, a.into_uuid());

    let seen_by_a = items.find(&ctx(a), Filter::new(), &FindOptions::default()).await.unwrap();
    assert_eq!(seen_by_a.len(), 1);
    assert_eq!(seen_by_a[0].sku, "MILK");

    assert!(items.find_by_id(&ctx(b), milk.id).await.unwrap().is_none());
    assert_eq!(items.count(&ctx(b), Filter::new()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_cross_tenant_update_and_delete_change_nothing() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let items = TenantRepository::<Item>::new(store);
    let (a, b) = (CompanyId::new(), CompanyId::new());
    let milk = items.create(&ctx(a), &item("MILK")).await.unwrap();

    let updated = items
        .update(&ctx(b), milk.id, patch(json!({"name": "Hijacked"})))
        .await
        .unwrap();
    assert!(updated.is_none());
    assert!(!items.delete(&ctx(b), milk.id).await.unwrap());

    let unchanged = items.get(&ctx(a), milk.id).await.unwrap();
    assert_eq!(unchanged.name, "Item MILK");
}

#[tokio::test]
async fn test_explicit_foreign_company_is_rejected() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let items = TenantRepository::<Item>::new(store);
    let (a, b) = (CompanyId::new(), CompanyId::new());

    let filter = Filter::new().eq("company_id", b.into_uuid());
    let err = items
        .find(&ctx(a), filter, &FindOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TenantMismatch);

    let mut foreign = item("MILK");
    foreign.company_id = b.into_uuid();
    let err = items.create(&ctx(a), &foreign).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TenantMismatch);
}

#[tokio::test]
async fn test_missing_context_fails_before_storage() {
    let store = Arc::new(CountingStore::default());
    let items = TenantRepository::<Item>::new(store.clone());
    let detached = TenantContext::detached();

    let err = items.find(&detached, Filter::new(), &FindOptions::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TenantContextMissing);
    let err = items.create(&detached, &item("MILK")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TenantContextMissing);
    let err = items.delete(&detached, Uuid::now_v7()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TenantContextMissing);
    let err = items.aggregate(&detached, Pipeline::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TenantContextMissing);

    let not_one_tenant = Filter::new().with("company_id", FilterOp::IsNotNull, FilterValue::Null);
    let err = items
        .count(&ctx(CompanyId::new()), not_one_tenant)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TenantMismatch);

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_detached_context_with_explicit_company() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let items = TenantRepository::<Item>::new(store);
    let a = CompanyId::new();
    items.create(&ctx(a), &item("MILK")).await.unwrap();

    let found = items
        .find(
            &TenantContext::detached(),
            Filter::new().eq("company_id", a.into_uuid()),
            &FindOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_ledger_rejects_update_and_delete_without_io() {
    let store = Arc::new(CountingStore::default());
    let ledger = TenantRepository::<LedgerEntry>::new(store.clone());
    let a = CompanyId::new();

    let recorded = ledger
        .create(&ctx(a), &entry(Uuid::now_v7(), Uuid::now_v7(), 12))
        .await
        .unwrap();
    let calls_after_insert = store.calls();

    let err = ledger
        .update(&ctx(a), recorded.id, patch(json!({"quantity_delta": 100})))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImmutableEntity);
    let err = ledger.delete(&ctx(a), recorded.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImmutableEntity);
    assert_eq!(store.calls(), calls_after_insert);

    let stored = ledger.get(&ctx(a), recorded.id).await.unwrap();
    assert_eq!(stored.quantity_delta, 12);
}

#[tokio::test]
async fn test_aggregate_only_sees_own_tenant() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let ledger = TenantRepository::<LedgerEntry>::new(store);
    let (a, b) = (CompanyId::new(), CompanyId::new());
    let (item_id, location_id) = (Uuid::now_v7(), Uuid::now_v7());

    ledger.create(&ctx(a), &entry(item_id, location_id, 10)).await.unwrap();
    ledger.create(&ctx(a), &entry(item_id, location_id, -3)).await.unwrap();
    ledger.create(&ctx(b), &entry(item_id, location_id, 500)).await.unwrap();

    let pipeline = Pipeline::new().group(&["item_id"], vec![Accumulator::sum("quantity_delta", "on_hand")]);
    let rows = ledger.aggregate(&ctx(a), pipeline).await.unwrap();
    assert_eq!(rows, vec![json!({"item_id": item_id.to_string(), "on_hand": 7})]);
}

#[tokio::test]
async fn test_find_page_reports_totals() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let items = TenantRepository::<Item>::new(store);
    let a = CompanyId::new();
    for sku in ["C", "A", "B"] {
        items.create(&ctx(a), &item(sku)).await.unwrap();
    }

    let page = items
        .find_page(&ctx(a), Filter::new(), vec![SortField::asc("sku")], PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total_items, 3);
    assert!(page.has_next);
    let skus: Vec<&str> = page.items.iter().map(|i| i.sku.as_str()).collect();
    assert_eq!(skus, vec!["A", "B"]);
}
