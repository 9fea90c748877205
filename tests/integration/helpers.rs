//! Shared test helpers for integration tests.

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use stockdesk_api::AppState;
use stockdesk_core::config::AppConfig;

/// A password that satisfies the length, class, and strength rules.
pub const PASSWORD: &str = "Tangerine-Ledger-42!";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application state, for direct store access
    pub state: AppState,
}

/// A registered user's credentials.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token
    pub access_token: String,
    /// `refresh_token=<value>` pair for the Cookie header
    pub cookie: String,
}

impl TestApp {
    /// Create a new test application over the in-memory backends
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.server.environment = "test".to_string();
        config.database.provider = "memory".to_string();
        config.cache.provider = "memory".to_string();
        config.auth.access_token_secret = "integration-access-secret".to_string();
        config.auth.refresh_token_secret = "integration-refresh-secret".to_string();
        config.worker.enabled = false;

        let state = stockdesk_api::build_state(config)
            .await
            .expect("Failed to build application state");
        let router = stockdesk_api::build_app(state.clone());

        Self { router, state }
    }

    /// Make a request with optional JSON body, bearer token, and cookie
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }

        let body = match body {
            Some(b) => {
                req = req.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_string(&b).expect("Failed to serialize body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(req.body(body).expect("Failed to build request"))
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, headers, body }
    }

    /// Register a new user and return their session
    pub async fn register(&self, email: &str) -> Session {
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(json!({ "email": email, "password": PASSWORD, "name": "Test User" })),
                None,
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "register failed: {}", response.body);
        response.session()
    }

    /// Exchange the session's refresh cookie for a new session
    pub async fn refresh(&self, session: &Session) -> TestResponse {
        self.request("POST", "/api/auth/refresh", None, None, Some(&session.cookie))
            .await
    }

    /// Register, create a company, and refresh so the token carries it
    pub async fn owner(&self, email: &str, company: &str) -> Session {
        let session = self.register(email).await;
        let response = self
            .request(
                "POST",
                "/api/companies",
                Some(json!({ "name": company })),
                Some(&session.access_token),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "create company failed: {}", response.body);

        let refreshed = self.refresh(&session).await;
        assert_eq!(refreshed.status, StatusCode::OK);
        refreshed.session()
    }
}

/// Test response wrapper
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The refresh cookie set by this response, as `name=value`
    pub fn refresh_cookie(&self) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("refresh_token="))
            .map(|v| v.split(';').next().unwrap_or_default().to_string())
    }

    /// Whether this response tells the browser to drop the refresh cookie
    pub fn clears_refresh_cookie(&self) -> bool {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with("refresh_token=;") && v.contains("Max-Age=0"))
    }

    /// Session carried by a login, register, or refresh response
    pub fn session(&self) -> Session {
        Session {
            access_token: self.body["data"]["access_token"]
                .as_str()
                .expect("access_token missing")
                .to_string(),
            cookie: self.refresh_cookie().expect("refresh cookie missing"),
        }
    }

    /// The `error` code of a failed response
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
