//! Inventory services against the in-memory stores.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{Map, json};
use uuid::Uuid;

use stockdesk_auth::PermissionEvaluator;
use stockdesk_core::ErrorKind;
use stockdesk_core::types::{CompanyId, PageRequest, RoleId, UserId};
use stockdesk_database::{Stores, TenantRepository};
use stockdesk_entity::inventory::{LedgerEntry, LedgerReason};
use stockdesk_entity::role::{Module, ModuleAccess};
use stockdesk_entity::user::{CreateUser, User};
use stockdesk_service::company::{CreateCompanyInput, CreateInviteInput, AcceptInviteInput};
use stockdesk_service::inventory::{
    CorrectEntryInput, CreateItemInput, CreateLocationInput, ItemListQuery, LedgerListQuery, RecordEntryInput,
    UpdateItemInput,
};
use stockdesk_service::role::{AssignRoleInput, CreateRoleInput};
use stockdesk_service::{
    CompanyService, ItemService, LedgerService, LocationService, LogNotifier, RequestContext, RoleService,
};

struct Harness {
    stores: Stores,
    companies: CompanyService,
    roles: RoleService,
    items: ItemService,
    locations: LocationService,
    ledger: LedgerService,
}

impl Harness {
    fn new() -> Self {
        let stores = Stores::memory();
        let permissions = PermissionEvaluator::new(stores.records.clone());
        Self {
            companies: CompanyService::new(
                stores.accounts.clone(),
                stores.records.clone(),
                permissions.clone(),
                Arc::new(LogNotifier),
                Duration::hours(72),
            ),
            roles: RoleService::new(stores.records.clone(), stores.accounts.clone(), permissions.clone()),
            items: ItemService::new(stores.records.clone(), permissions.clone()),
            locations: LocationService::new(stores.records.clone(), permissions.clone()),
            ledger: LedgerService::new(stores.records.clone(), permissions),
            stores,
        }
    }

    async fn user(&self, email: &str) -> User {
        self.stores
            .accounts
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "unused".to_string(),
                name: "Test".to_string(),
            })
            .await
            .unwrap()
    }

    /// Context reflecting the user's stored associations, as after a refresh.
    async fn ctx(&self, user: &User) -> RequestContext {
        let user = self
            .stores
            .accounts
            .find_user(UserId::from_uuid(user.id))
            .await
            .unwrap()
            .unwrap();
        RequestContext {
            user_id: UserId::from_uuid(user.id),
            email: user.email.clone(),
            company_id: user.company_id.map(CompanyId::from_uuid),
            role_id: user.role_id.map(RoleId::from_uuid),
            request_time: Utc::now(),
        }
    }

    async fn owner(&self, email: &str, company: &str) -> RequestContext {
        let user = self.user(email).await;
        self.companies
            .create_company(&self.ctx(&user).await, CreateCompanyInput { name: company.to_string() })
            .await
            .unwrap();
        self.ctx(&user).await
    }
}

fn item_input(sku: &str) -> CreateItemInput {
    CreateItemInput {
        sku: sku.to_string(),
        name: format!("Item {sku}"),
        unit: "each".to_string(),
        price_cents: 250,
        reorder_level: 5,
    }
}

#[tokio::test]
async fn test_items_are_partitioned_by_company() {
    let h = Harness::new();
    let a = h.owner("a@shop.test", "A").await;
    let b = h.owner("b@shop.test", "B").await;

    let ia = h.items.create(&a, item_input("MILK-1")).await.unwrap();
    h.items.create(&b, item_input("MILK-1")).await.unwrap();

    let page = h.items.list(&a, ItemListQuery::default(), PageRequest::default()).await.unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].id, ia.id);

    let update = UpdateItemInput {
        name: Some("Hijacked".to_string()),
        ..UpdateItemInput::default()
    };
    assert_eq!(h.items.update(&b, ia.id, update).await.unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(h.items.delete(&b, ia.id).await.unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(h.items.get(&b, ia.id).await.unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(h.items.get(&a, ia.id).await.unwrap().name, "Item MILK-1");
}

#[tokio::test]
async fn test_duplicate_sku_conflicts_within_company() {
    let h = Harness::new();
    let a = h.owner("a@shop.test", "A").await;
    h.items.create(&a, item_input("BREAD")).await.unwrap();
    let err = h.items.create(&a, item_input("BREAD")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_item_search_is_case_insensitive() {
    let h = Harness::new();
    let a = h.owner("a@shop.test", "A").await;
    h.items.create(&a, item_input("OAT-MILK")).await.unwrap();
    h.items.create(&a, item_input("BREAD")).await.unwrap();

    let query = ItemListQuery {
        search: Some("oat".to_string()),
        active: None,
    };
    let page = h.items.list(&a, query, PageRequest::default()).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].sku, "OAT-MILK");
}

#[tokio::test]
async fn test_company_without_membership_is_forbidden() {
    let h = Harness::new();
    let loner = h.user("loner@shop.test").await;
    let err = h
        .items
        .list(&h.ctx(&loner).await, ItemListQuery::default(), PageRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_read_only_role_cannot_write() {
    let h = Harness::new();
    let owner = h.owner("owner@shop.test", "A").await;

    let mut permissions = BTreeMap::new();
    permissions.insert(Module::Items, ModuleAccess::read_only());
    let clerk_role = h
        .roles
        .create(
            &owner,
            CreateRoleInput {
                name: "Clerk".to_string(),
                description: None,
                permissions,
            },
        )
        .await
        .unwrap();
    let company_id = owner.company_id.unwrap().into_uuid();
    let invite = h
        .companies
        .create_invite(
            &owner,
            CreateInviteInput {
                email: "clerk@shop.test".to_string(),
                role_id: clerk_role.id,
            },
        )
        .await
        .unwrap();
    let clerk = h.user("clerk@shop.test").await;
    h.companies
        .accept_invite(
            &h.ctx(&clerk).await,
            AcceptInviteInput {
                company_id,
                token: invite.token,
            },
        )
        .await
        .unwrap();
    let clerk = h.ctx(&clerk).await;

    h.items.create(&owner, item_input("SOAP")).await.unwrap();
    let page = h.items.list(&clerk, ItemListQuery::default(), PageRequest::default()).await.unwrap();
    assert_eq!(page.total_items, 1);

    let err = h.items.create(&clerk, item_input("SOAP-2")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
    let err = h.ledger.stock(&clerk, LedgerListQuery::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_owner_role_cannot_be_deleted() {
    let h = Harness::new();
    let owner = h.owner("owner@shop.test", "A").await;
    let role_id = owner.role_id.unwrap().into_uuid();
    let err = h.roles.delete(&owner, role_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_only_owners_grant_or_revoke_full_access() {
    let h = Harness::new();
    let owner = h.owner("owner@shop.test", "A").await;
    let owner_role = owner.role_id.unwrap().into_uuid();

    let mut permissions = BTreeMap::new();
    permissions.insert(Module::Roles, ModuleAccess::full([]));
    let manager_role = h
        .roles
        .create(
            &owner,
            CreateRoleInput {
                name: "Manager".to_string(),
                description: None,
                permissions,
            },
        )
        .await
        .unwrap();
    let invite = h
        .companies
        .create_invite(
            &owner,
            CreateInviteInput {
                email: "manager@shop.test".to_string(),
                role_id: manager_role.id,
            },
        )
        .await
        .unwrap();
    let manager_user = h.user("manager@shop.test").await;
    h.companies
        .accept_invite(
            &h.ctx(&manager_user).await,
            AcceptInviteInput {
                company_id: owner.company_id.unwrap().into_uuid(),
                token: invite.token,
            },
        )
        .await
        .unwrap();
    let manager = h.ctx(&manager_user).await;

    let promote = AssignRoleInput { user_id: manager_user.id };
    let err = h.roles.assign(&manager, owner_role, promote.clone()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let demote = AssignRoleInput {
        user_id: owner.user_id.into_uuid(),
    };
    let err = h.roles.assign(&manager, manager_role.id, demote).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
    let stored_owner = h.stores.accounts.find_user(owner.user_id).await.unwrap().unwrap();
    assert_eq!(stored_owner.role_id, Some(owner_role));

    h.roles.assign(&owner, owner_role, promote).await.unwrap();
    assert_eq!(h.ctx(&manager_user).await.role_id, owner.role_id);
}

#[tokio::test]
async fn test_ledger_is_append_only_and_corrections_balance() {
    let h = Harness::new();
    let a = h.owner("a@shop.test", "A").await;
    let item = h.items.create(&a, item_input("MILK")).await.unwrap();
    let store = h
        .locations
        .create(
            &a,
            CreateLocationInput {
                name: "Main Street".to_string(),
                code: "main".to_string(),
                address: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(store.code, "MAIN");

    let receipt = h
        .ledger
        .record(
            &a,
            RecordEntryInput {
                item_id: item.id,
                location_id: store.id,
                quantity_delta: 24,
                reason: LedgerReason::Receipt,
                reference: Some("INV-1001".to_string()),
            },
        )
        .await
        .unwrap();
    h.ledger
        .record(
            &a,
            RecordEntryInput {
                item_id: item.id,
                location_id: store.id,
                quantity_delta: -4,
                reason: LedgerReason::Sale,
                reference: None,
            },
        )
        .await
        .unwrap();

    let stock = h.ledger.stock(&a, LedgerListQuery::default()).await.unwrap();
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].on_hand, 20);

    let mut patch = Map::new();
    patch.insert("quantity_delta".to_string(), json!(100));
    let err = h.ledger.update(&a, receipt.id, patch).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImmutableEntity);
    let err = h.ledger.delete(&a, receipt.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ImmutableEntity);
    assert_eq!(h.ledger.get(&a, receipt.id).await.unwrap().quantity_delta, 24);

    let correction = h
        .ledger
        .correct(&a, receipt.id, CorrectEntryInput { reference: Some("miscount".to_string()) })
        .await
        .unwrap();
    assert_eq!(correction.quantity_delta, -24);
    assert_eq!(correction.corrects_entry_id, Some(receipt.id));

    let again = h.ledger.correct(&a, receipt.id, CorrectEntryInput::default()).await.unwrap_err();
    assert_eq!(again.kind, ErrorKind::Conflict);

    let stock = h.ledger.stock(&a, LedgerListQuery::default()).await.unwrap();
    assert_eq!(stock[0].on_hand, -4);
}

#[tokio::test]
async fn test_ledger_rejects_system_reasons_and_foreign_items() {
    let h = Harness::new();
    let a = h.owner("a@shop.test", "A").await;
    let b = h.owner("b@shop.test", "B").await;
    let foreign_item = h.items.create(&b, item_input("B-ONLY")).await.unwrap();
    let location = h
        .locations
        .create(
            &a,
            CreateLocationInput {
                name: "Back room".to_string(),
                code: "BACK".to_string(),
                address: None,
            },
        )
        .await
        .unwrap();

    let err = h
        .ledger
        .record(
            &a,
            RecordEntryInput {
                item_id: foreign_item.id,
                location_id: location.id,
                quantity_delta: 1,
                reason: LedgerReason::Receipt,
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = h
        .ledger
        .record(
            &a,
            RecordEntryInput {
                item_id: Uuid::now_v7(),
                location_id: location.id,
                quantity_delta: 1,
                reason: LedgerReason::Correction,
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = h
        .ledger
        .record(
            &a,
            RecordEntryInput {
                item_id: foreign_item.id,
                location_id: location.id,
                quantity_delta: 0,
                reason: LedgerReason::Adjustment,
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_entry_can_only_be_compensated_once() {
    let h = Harness::new();
    let a = h.owner("a@shop.test", "A").await;
    let item = h.items.create(&a, item_input("RICE")).await.unwrap();
    let location = h
        .locations
        .create(
            &a,
            CreateLocationInput {
                name: "Main".to_string(),
                code: "MAIN".to_string(),
                address: None,
            },
        )
        .await
        .unwrap();
    let receipt = h
        .ledger
        .record(
            &a,
            RecordEntryInput {
                item_id: item.id,
                location_id: location.id,
                quantity_delta: 7,
                reason: LedgerReason::Receipt,
                reference: None,
            },
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        h.ledger.correct(&a, receipt.id, CorrectEntryInput::default()),
        h.ledger.correct(&a, receipt.id, CorrectEntryInput::default()),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let lost = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(lost.kind, ErrorKind::Conflict);

    // A writer that passed the "already corrected" check late still
    // collides with the stored compensation.
    let entries = TenantRepository::<LedgerEntry>::new(h.stores.records.clone());
    let late = receipt.compensation(a.user_id.into_uuid(), Some("late".to_string()));
    let err = entries.create(&a.tenant(), &late).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let stock = h.ledger.stock(&a, LedgerListQuery::default()).await.unwrap();
    assert_eq!(stock[0].on_hand, 0);
}
