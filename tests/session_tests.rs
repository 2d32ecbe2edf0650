mod common;

use catalog_admin::clock::Clock;
use catalog_admin::error::{AuthError, LOGIN_FAILED_NOTICE, SESSION_EXPIRED_NOTICE};
use catalog_admin::session::Credentials;
use catalog_admin::CatalogAdmin;
use catalog_admin::storage::{Cookie, CookieJar, Storage, EXPIRATION_KEY, TOKEN_KEY};
use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/admin/signin"))
        .and(body_json(json!({
            "username": "admin@example.com",
            "password": "password123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sign_in_body()))
        .mount(server)
        .await;
}

fn credentials() -> Credentials {
    Credentials::new("admin@example.com", "password123")
}

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0
    }
}

#[tokio::test]
async fn test_login_persists_token_and_fixed_expiry() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    let (admin, storage, _prompt) = setup(&server);

    let before = now_ms();
    let session = admin.session().login(&credentials()).await.unwrap();
    let after = now_ms();

    // The server's "expired" value is ignored in favour of the 5 minute window
    assert_eq!(session.token, TOKEN);
    assert!(session.is_authenticated);
    assert!(session.expires_at_epoch_ms >= before + 300_000);
    assert!(session.expires_at_epoch_ms <= after + 300_000);

    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), Some(TOKEN.to_string()));
    assert_eq!(
        storage.get_item(EXPIRATION_KEY).unwrap(),
        Some(session.expires_at_epoch_ms.to_string())
    );
    assert_eq!(admin.context().cookie_token().unwrap(), Some(TOKEN.to_string()));
    assert_eq!(admin.context().default_authorization(), Some(TOKEN.to_string()));
    assert!(admin.session().has_pending_expiry());
}

#[tokio::test]
async fn test_login_failure_is_reported_generically() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/admin/signin"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "帳號或密碼錯誤"
        })))
        .mount(&server)
        .await;
    let (admin, storage, _prompt) = setup(&server);

    let err = admin.session().login(&credentials()).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials(ref m) if m == "帳號或密碼錯誤"));
    assert_eq!(err.user_message(), LOGIN_FAILED_NOTICE);
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert!(admin.session().session().is_none());
}

#[tokio::test]
async fn test_login_without_token_in_response_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/admin/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "登入失敗"
        })))
        .mount(&server)
        .await;
    let (admin, _storage, _prompt) = setup(&server);

    let result = admin.session().login(&credentials()).await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    assert!(!admin.session().has_pending_expiry());
}

#[tokio::test]
async fn test_check_session_accepts_valid_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/check"))
        .and(header("Authorization", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let (admin, storage, _prompt) = setup(&server);
    let expires_at = store_session(&storage, Duration::from_secs(60));

    admin.session().check_session().await.unwrap();

    let session = admin.session().session().unwrap();
    assert_eq!(session.expires_at_epoch_ms, expires_at);
    assert!(admin.context().is_authenticated());
}

#[tokio::test]
async fn test_check_session_failure_clears_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/check"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;
    let (admin, storage, _prompt) = setup(&server);
    store_session(&storage, Duration::from_secs(60));
    admin
        .context()
        .set_default_authorization(Some(TOKEN.to_string()));

    let err = admin.session().check_session().await.unwrap_err();

    assert!(matches!(err, AuthError::CheckFailed(status) if status.as_u16() == 403));
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(EXPIRATION_KEY).unwrap(), None);
    assert_eq!(admin.context().default_authorization(), None);
    assert!(!admin.context().is_authenticated());
}

#[tokio::test]
async fn test_check_session_without_expiry_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/check"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (admin, storage, _prompt) = setup(&server);
    storage.set_item(TOKEN_KEY, TOKEN).unwrap();

    let err = admin.session().check_session().await.unwrap_err();

    assert!(matches!(err, AuthError::MissingSession));
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_restore_without_expiry_arms_nothing_and_checks_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/check"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (admin, storage, prompt) = setup(&server);
    let jar = CookieJar::new(storage.clone());
    jar.set(&Cookie::session(TOKEN_KEY, TOKEN, now_ms() + 60_000))
        .unwrap();

    let restored = admin.session().restore_session().await;

    assert!(restored.is_none());
    assert!(!admin.session().has_pending_expiry());
    assert!(prompt.notices().is_empty());
}

#[tokio::test]
async fn test_restore_with_future_expiry_checks_and_arms_timer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/check"))
        .and(header("Authorization", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let (admin, storage, _prompt) = setup(&server);
    let expires_at = store_session(&storage, Duration::from_secs(120));
    CookieJar::new(storage.clone())
        .set(&Cookie::session(TOKEN_KEY, TOKEN, expires_at))
        .unwrap();

    let restored = admin.session().restore_session().await.unwrap();

    assert_eq!(restored.token, TOKEN);
    assert_eq!(restored.expires_at_epoch_ms, expires_at);
    assert!(admin.session().has_pending_expiry());
}

#[tokio::test]
async fn test_expiry_timer_fires_once_and_clears() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    let storage = Arc::new(catalog_admin::storage::MemoryStorage::new());
    let prompt = RecordingPrompt::accepting();
    let config = config_for(&server).with_session_window(Duration::from_millis(200));
    let admin = admin_with(config, storage.clone(), prompt.clone());

    admin.session().login(&credentials()).await.unwrap();
    assert!(admin.session().has_pending_expiry());

    sleep(Duration::from_millis(700)).await;

    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(EXPIRATION_KEY).unwrap(), None);
    assert_eq!(admin.context().default_authorization(), None);
    assert!(admin.session().session().is_none());
    assert!(!admin.session().has_pending_expiry());
    assert_eq!(prompt.notices(), vec![SESSION_EXPIRED_NOTICE.to_string()]);
}

#[tokio::test]
async fn test_logout_clears_state_and_cancels_timer() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    let storage = Arc::new(catalog_admin::storage::MemoryStorage::new());
    let prompt = RecordingPrompt::accepting();
    let config = config_for(&server).with_session_window(Duration::from_millis(200));
    let admin = admin_with(config, storage.clone(), prompt.clone());

    admin.session().login(&credentials()).await.unwrap();
    admin.session().logout();

    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(EXPIRATION_KEY).unwrap(), None);
    assert_eq!(admin.context().cookie_token().unwrap(), None);
    assert_eq!(admin.context().default_authorization(), None);
    assert!(!admin.session().has_pending_expiry());

    sleep(Duration::from_millis(500)).await;
    assert!(prompt.notices().is_empty());
}

#[tokio::test]
async fn test_new_login_supersedes_previous_timer() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    let storage = Arc::new(catalog_admin::storage::MemoryStorage::new());
    let prompt = RecordingPrompt::accepting();
    let config = config_for(&server).with_session_window(Duration::from_millis(600));
    let admin = admin_with(config, storage.clone(), prompt.clone());

    admin.session().login(&credentials()).await.unwrap();
    sleep(Duration::from_millis(300)).await;
    let second = admin.session().login(&credentials()).await.unwrap();

    // Past the first login's expiry, before the second one's
    sleep(Duration::from_millis(450)).await;
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), Some(TOKEN.to_string()));
    assert_eq!(
        storage.get_item(EXPIRATION_KEY).unwrap(),
        Some(second.expires_at_epoch_ms.to_string())
    );
    assert!(prompt.notices().is_empty());

    sleep(Duration::from_millis(600)).await;
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(prompt.notices(), vec![SESSION_EXPIRED_NOTICE.to_string()]);
}

#[tokio::test]
async fn test_dropping_the_client_cancels_the_timer() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    let storage = Arc::new(catalog_admin::storage::MemoryStorage::new());
    let prompt = RecordingPrompt::accepting();
    let config = config_for(&server).with_session_window(Duration::from_millis(200));
    let admin = admin_with(config, storage.clone(), prompt.clone());

    admin.session().login(&credentials()).await.unwrap();
    drop(admin);

    sleep(Duration::from_millis(500)).await;
    assert!(prompt.notices().is_empty());
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), Some(TOKEN.to_string()));
}

#[tokio::test]
async fn test_check_session_at_exact_expiry_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user/check"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let expires_at = 1_700_000_000_000;
    let storage = Arc::new(catalog_admin::storage::MemoryStorage::new());
    let admin = CatalogAdmin::new_with_clock(
        config_for(&server),
        storage.clone(),
        RecordingPrompt::accepting(),
        Arc::new(FixedClock(expires_at)),
    )
    .unwrap();
    storage.set_item(TOKEN_KEY, TOKEN).unwrap();
    storage
        .set_item(EXPIRATION_KEY, &expires_at.to_string())
        .unwrap();

    let err = admin.session().check_session().await.unwrap_err();

    assert!(matches!(err, AuthError::Expired));
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_login_with_elapsed_window_expires_at_once() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("GET"))
        .and(path(products_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(&["a"])))
        .expect(0)
        .mount(&server)
        .await;
    let storage = Arc::new(catalog_admin::storage::MemoryStorage::new());
    let prompt = RecordingPrompt::accepting();
    let config = config_for(&server).with_session_window(Duration::from_micros(500));
    let admin = admin_with(config, storage.clone(), prompt.clone());

    let err = admin.sign_in(&credentials()).await.unwrap_err();

    assert_eq!(err.user_message(), SESSION_EXPIRED_NOTICE);
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(EXPIRATION_KEY).unwrap(), None);
    assert_eq!(admin.context().default_authorization(), None);
    assert!(!admin.context().is_authenticated());
    assert!(!admin.session().has_pending_expiry());
    assert!(admin.catalog().is_stale());
    assert_eq!(prompt.notices(), vec![SESSION_EXPIRED_NOTICE.to_string()]);
}
