//! Refresh rotation, reuse detection, logout, and tenant claims over HTTP.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_register_sets_refresh_cookie_only() {
    let app = TestApp::new().await;
    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "email": "owner@shop.test", "password": PASSWORD, "name": "Owner" })),
            None,
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["access_token"].is_string());
    assert!(response.body["data"].get("refresh_token").is_none());
    assert!(response.body["data"]["user"].get("password_hash").is_none());

    let set_cookie = response
        .headers
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refresh_token="))
        .expect("refresh cookie missing")
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/api/auth"));
    assert!(set_cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_login_rejects_wrong_password_uniformly() {
    let app = TestApp::new().await;
    app.register("owner@shop.test").await;

    let wrong = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "owner@shop.test", "password": "not-the-password" })),
            None,
            None,
        )
        .await;
    let unknown = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "nobody@shop.test", "password": PASSWORD })),
            None,
            None,
        )
        .await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body, unknown.body);

    let ok = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "Owner@Shop.test", "password": PASSWORD })),
            None,
            None,
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.refresh_cookie().is_some());
}

#[tokio::test]
async fn test_rotation_chain_rejects_every_predecessor() {
    let app = TestApp::new().await;
    let s1 = app.register("owner@shop.test").await;

    let r = app.refresh(&s1).await;
    assert_eq!(r.status, StatusCode::OK);
    let s2 = r.session();

    let replay = app.refresh(&s1).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert!(replay.clears_refresh_cookie());

    let r = app.refresh(&s2).await;
    assert_eq!(r.status, StatusCode::OK);
    let s3 = r.session();

    for stale in [&s1, &s2] {
        let response = app.refresh(stale).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.error_code(), "UNAUTHORIZED");
        assert!(response.clears_refresh_cookie());
    }

    assert_eq!(app.refresh(&s3).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_failures_are_indistinguishable() {
    let app = TestApp::new().await;

    let missing = app.request("POST", "/api/auth/refresh", None, None, None).await;
    let garbage = app
        .request("POST", "/api/auth/refresh", None, None, Some("refresh_token=not-a-jwt"))
        .await;

    // An access token presented as a refresh token is signed with the wrong secret.
    let session = app.register("owner@shop.test").await;
    let cookie = format!("refresh_token={}", session.access_token);
    let wrong_kind = app
        .request("POST", "/api/auth/refresh", None, None, Some(&cookie))
        .await;

    for response in [&missing, &garbage, &wrong_kind] {
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(response.clears_refresh_cookie());
    }
    assert_eq!(garbage.body, wrong_kind.body);
}

#[tokio::test]
async fn test_logout_revokes_and_clears_cookie() {
    let app = TestApp::new().await;
    let session = app.register("owner@shop.test").await;

    let logout = app
        .request("POST", "/api/auth/logout", None, None, Some(&session.cookie))
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout.clears_refresh_cookie());

    assert_eq!(app.refresh(&session).await.status, StatusCode::UNAUTHORIZED);

    // Logging out again, or without any cookie, still succeeds.
    let again = app
        .request("POST", "/api/auth/logout", None, None, Some(&session.cookie))
        .await;
    assert_eq!(again.status, StatusCode::OK);
    let bare = app.request("POST", "/api/auth/logout", None, None, None).await;
    assert_eq!(bare.status, StatusCode::OK);
    assert!(bare.clears_refresh_cookie());
}

#[tokio::test]
async fn test_refresh_picks_up_new_company() {
    let app = TestApp::new().await;
    let session = app.register("owner@shop.test").await;

    let created = app
        .request(
            "POST",
            "/api/companies",
            Some(json!({ "name": "Corner Shop" })),
            Some(&session.access_token),
            None,
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    let company_id = created.body["data"]["company"]["id"].clone();
    let role_id = created.body["data"]["role"]["id"].clone();

    let me = app
        .request("GET", "/api/auth/me", None, Some(&session.access_token), None)
        .await;
    assert!(me.body["data"]["company_id"].is_null());
    assert_eq!(me.body["data"]["profile"]["user"]["company_id"], company_id);

    // The old token has no tenant, so tenant routes are refused.
    let items = app
        .request("GET", "/api/items", None, Some(&session.access_token), None)
        .await;
    assert_eq!(items.status, StatusCode::FORBIDDEN);

    let refreshed = app.refresh(&session).await.session();
    let me = app
        .request("GET", "/api/auth/me", None, Some(&refreshed.access_token), None)
        .await;
    assert_eq!(me.body["data"]["company_id"], company_id);
    assert_eq!(me.body["data"]["role_id"], role_id);

    let items = app
        .request("GET", "/api/items", None, Some(&refreshed.access_token), None)
        .await;
    assert_eq!(items.status, StatusCode::OK);
}

#[tokio::test]
async fn test_bearer_is_required() {
    let app = TestApp::new().await;

    let none = app.request("GET", "/api/items", None, None, None).await;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);

    let session = app.register("owner@shop.test").await;
    let cookie_only = app
        .request("GET", "/api/auth/me", None, None, Some(&session.cookie))
        .await;
    assert_eq!(cookie_only.status, StatusCode::UNAUTHORIZED);

    let health = app.request("GET", "/api/health", None, None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["data"]["status"], "ok");
}
