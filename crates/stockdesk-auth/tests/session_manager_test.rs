//! Refresh-session lifecycle against the in-memory stores.

use std::sync::Arc;

use stockdesk_auth::{PasswordHasher, SessionManager};
use stockdesk_core::ErrorKind;
use stockdesk_core::config::AuthConfig;
use stockdesk_core::types::{CompanyId, RoleId, UserId};
use stockdesk_database::Stores;
use stockdesk_entity::user::{CreateUser, User};

const PASSWORD: &str = "Tangerine-Lantern-58-Quarry";

fn config() -> AuthConfig {
    AuthConfig {
        access_token_secret: "test-access-secret".to_string(),
        refresh_token_secret: "test-refresh-secret".to_string(),
        ..AuthConfig::default()
    }
}

async fn setup() -> (SessionManager, Stores, User) {
    let stores = Stores::memory();
    let manager = SessionManager::new(&config(), stores.sessions.clone(), stores.accounts.clone()).unwrap();
    let user = stores
        .accounts
        .create_user(CreateUser {
            email: "ana@shop.test".to_string(),
            password_hash: PasswordHasher::new().hash_password(PASSWORD).unwrap(),
            name: "Ana".to_string(),
        })
        .await
        .unwrap();
    (manager, stores, user)
}

#[tokio::test]
async fn test_rotated_token_cannot_be_reused() {
    let (manager, _, user) = setup().await;
    let s1 = manager.issue_session(&user).await.unwrap();

    let s2 = manager.rotate(&s1.refresh_token).await.unwrap();
    let err = manager.rotate(&s1.refresh_token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let s3 = manager.rotate(&s2.refresh_token).await.unwrap();
    assert_eq!(manager.rotate(&s1.refresh_token).await.unwrap_err().kind, ErrorKind::Unauthorized);
    assert_eq!(manager.rotate(&s2.refresh_token).await.unwrap_err().kind, ErrorKind::Unauthorized);

    manager.rotate(&s3.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_rotation_chain_has_one_live_session() {
    let (manager, stores, user) = setup().await;
    let mut current = manager.issue_session(&user).await.unwrap();
    const ROTATIONS: usize = 5;
    for _ in 0..ROTATIONS {
        current = manager.rotate(&current.refresh_token).await.unwrap();
    }

    let sessions = stores.sessions.list_for_user(UserId::from_uuid(user.id)).await.unwrap();
    assert_eq!(sessions.len(), ROTATIONS + 1);
    let live: Vec<_> = sessions.iter().filter(|s| s.revoked_at.is_none()).collect();
    assert_eq!(live.len(), 1);

    // Follow the replacement links from the first session to the live one.
    let mut link = &sessions[0];
    for _ in 0..ROTATIONS {
        let next = link.replaced_by_hash.as_deref().expect("rotated session links forward");
        link = sessions.iter().find(|s| s.token_hash == next).expect("successor exists");
    }
    assert_eq!(link.token_hash, live[0].token_hash);
    assert!(link.replaced_by_hash.is_none());
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let (manager, _, user) = setup().await;
    let issued = manager.issue_session(&user).await.unwrap();

    manager.revoke(&issued.refresh_token).await;
    let err = manager.rotate(&issued.refresh_token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    // Revoking garbage or twice is silently accepted.
    manager.revoke("garbage").await;
    manager.revoke(&issued.refresh_token).await;
}

#[tokio::test]
async fn test_concurrent_rotations_yield_one_success() {
    let (manager, _, user) = setup().await;
    let issued = manager.issue_session(&user).await.unwrap();
    let manager = Arc::new(manager);

    let mut handles = Vec::new();
    for _ in 0..6 {
        let manager = Arc::clone(&manager);
        let token = issued.refresh_token.clone();
        handles.push(tokio::spawn(async move { manager.rotate(&token).await }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.kind, ErrorKind::Unauthorized),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let (manager, _, user) = setup().await;
    let issued = manager.issue_session(&user).await.unwrap();

    assert_eq!(manager.rotate(&issued.access_token).await.unwrap_err().kind, ErrorKind::Unauthorized);
    assert_eq!(manager.authenticate(&issued.refresh_token).unwrap_err().kind, ErrorKind::Unauthorized);
    assert_eq!(manager.authenticate(&issued.access_token).unwrap().sub, user.id);
}

#[tokio::test]
async fn test_rotation_reflects_current_company() {
    let (manager, stores, user) = setup().await;
    let issued = manager.issue_session(&user).await.unwrap();
    assert!(manager.authenticate(&issued.access_token).unwrap().company_id.is_none());

    let (company, role) = (CompanyId::new(), RoleId::new());
    stores
        .accounts
        .join_company(UserId::from_uuid(user.id), company, role)
        .await
        .unwrap();

    let rotated = manager.rotate(&issued.refresh_token).await.unwrap();
    let claims = manager.authenticate(&rotated.access_token).unwrap();
    assert_eq!(claims.company(), Some(company));
    assert_eq!(claims.role(), Some(role));
}

#[tokio::test]
async fn test_login_errors_are_uniform() {
    let (manager, _, _) = setup().await;
    let wrong_password = manager.login("ana@shop.test", "nope").await.unwrap_err();
    let unknown = manager.login("nobody@shop.test", PASSWORD).await.unwrap_err();
    assert_eq!(wrong_password.kind, ErrorKind::Unauthorized);
    assert_eq!(wrong_password.message, unknown.message);

    let issued = manager.login("ANA@shop.test", PASSWORD).await.unwrap();
    assert_eq!(issued.user.email, "ana@shop.test");
}

#[test]
fn test_shared_secret_is_a_configuration_error() {
    let stores = Stores::memory();
    let mut config = config();
    config.refresh_token_secret = config.access_token_secret.clone();
    let err = SessionManager::new(&config, stores.sessions, stores.accounts).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
}
