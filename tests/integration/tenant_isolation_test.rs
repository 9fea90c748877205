//! Cross-tenant access and ledger immutability over HTTP.

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{Session, TestApp};

async fn create_item(app: &TestApp, session: &Session, sku: &str) -> Value {
    let response = app
        .request(
            "POST",
            "/api/items",
            Some(json!({ "sku": sku, "name": format!("Item {sku}"), "price_cents": 199 })),
            Some(&session.access_token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "create item failed: {}", response.body);
    response.body["data"].clone()
}

#[tokio::test]
async fn test_other_tenant_cannot_touch_item() {
    let app = TestApp::new().await;
    let a = app.owner("a@shop.test", "Shop A").await;
    let b = app.owner("b@shop.test", "Shop B").await;

    let item = create_item(&app, &a, "MILK-1L").await;
    let path = format!("/api/items/{}", item["id"].as_str().unwrap());

    let update = app
        .request("PUT", &path, Some(json!({ "name": "Stolen" })), Some(&b.access_token), None)
        .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let delete = app.request("DELETE", &path, None, Some(&b.access_token), None).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let read = app.request("GET", &path, None, Some(&b.access_token), None).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);
    assert_eq!(read.body, update.body);

    let own = app.request("GET", &path, None, Some(&a.access_token), None).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["data"]["name"], "Item MILK-1L");
}

#[tokio::test]
async fn test_lists_only_show_own_rows() {
    let app = TestApp::new().await;
    let a = app.owner("a@shop.test", "Shop A").await;
    let b = app.owner("b@shop.test", "Shop B").await;

    create_item(&app, &a, "SHARED-SKU").await;
    create_item(&app, &b, "SHARED-SKU").await;
    create_item(&app, &b, "B-ONLY").await;

    let list = app.request("GET", "/api/items", None, Some(&a.access_token), None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["data"]["total_items"], 1);
    assert_eq!(list.body["data"]["items"][0]["sku"], "SHARED-SKU");

    let roles = app.request("GET", "/api/roles", None, Some(&a.access_token), None).await;
    assert_eq!(roles.body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ledger_entries_are_immutable() {
    let app = TestApp::new().await;
    let a = app.owner("a@shop.test", "Shop A").await;
    let item = create_item(&app, &a, "FLOUR").await;

    let location = app
        .request(
            "POST",
            "/api/locations",
            Some(json!({ "name": "Main", "code": "main" })),
            Some(&a.access_token),
            None,
        )
        .await;
    assert_eq!(location.status, StatusCode::OK);

    let entry = app
        .request(
            "POST",
            "/api/inventory/ledger",
            Some(json!({
                "item_id": item["id"],
                "location_id": location.body["data"]["id"],
                "quantity_delta": 10,
                "reason": "receipt",
            })),
            Some(&a.access_token),
            None,
        )
        .await;
    assert_eq!(entry.status, StatusCode::OK, "record failed: {}", entry.body);
    let path = format!("/api/inventory/ledger/{}", entry.body["data"]["id"].as_str().unwrap());

    for method in ["PUT", "PATCH"] {
        let response = app
            .request(method, &path, Some(json!({ "quantity_delta": 99 })), Some(&a.access_token), None)
            .await;
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.error_code(), "IMMUTABLE_ENTITY");
    }
    let delete = app.request("DELETE", &path, None, Some(&a.access_token), None).await;
    assert_eq!(delete.status, StatusCode::CONFLICT);
    assert_eq!(delete.error_code(), "IMMUTABLE_ENTITY");

    let correct = app
        .request("POST", &format!("{path}/correct"), Some(json!({})), Some(&a.access_token), None)
        .await;
    assert_eq!(correct.status, StatusCode::OK);
    assert_eq!(correct.body["data"]["quantity_delta"], -10);

    let stock = app
        .request("GET", "/api/inventory/stock", None, Some(&a.access_token), None)
        .await;
    assert_eq!(stock.body["data"][0]["on_hand"], 0);

    let read = app.request("GET", &path, None, Some(&a.access_token), None).await;
    assert_eq!(read.body["data"]["quantity_delta"], 10);
}

#[tokio::test]
async fn test_invited_member_joins_inviting_company() {
    let app = TestApp::new().await;
    let owner = app.owner("owner@shop.test", "Shop A").await;

    let role = app
        .request(
            "POST",
            "/api/roles",
            Some(json!({
                "name": "Clerk",
                "permissions": { "items": { "read": true } },
            })),
            Some(&owner.access_token),
            None,
        )
        .await;
    assert_eq!(role.status, StatusCode::OK, "create role failed: {}", role.body);

    let invite = app
        .request(
            "POST",
            "/api/companies/invites",
            Some(json!({ "email": "clerk@shop.test", "role_id": role.body["data"]["id"] })),
            Some(&owner.access_token),
            None,
        )
        .await;
    assert_eq!(invite.status, StatusCode::OK, "invite failed: {}", invite.body);
    let company_id = invite.body["data"]["invite"]["company_id"].clone();
    let token = invite.body["data"]["token"].clone();

    let clerk = app.register("clerk@shop.test").await;
    let accepted = app
        .request(
            "POST",
            "/api/companies/invites/accept",
            Some(json!({ "company_id": company_id, "token": token })),
            Some(&clerk.access_token),
            None,
        )
        .await;
    assert_eq!(accepted.status, StatusCode::OK, "accept failed: {}", accepted.body);

    let clerk = app.refresh(&clerk).await.session();
    create_item(&app, &owner, "SOAP").await;

    let list = app.request("GET", "/api/items", None, Some(&clerk.access_token), None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["data"]["total_items"], 1);

    let denied = app
        .request(
            "POST",
            "/api/items",
            Some(json!({ "sku": "X", "name": "X", "price_cents": 1 })),
            Some(&clerk.access_token),
            None,
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_page_far_past_the_end_is_empty() {
    let app = TestApp::new().await;
    let a = app.owner("a@shop.test", "Shop A").await;
    create_item(&app, &a, "TEA").await;

    let response = app
        .request("GET", "/api/items?page=400000000000000000", None, Some(&a.access_token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total_items"], 1);
    assert!(response.body["data"]["items"].as_array().unwrap().is_empty());
}
