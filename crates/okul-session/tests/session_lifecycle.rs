//! End-to-end session lifecycle scenarios, run against the in-memory
//! store the way the app runs against the platform keychain.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use okul_session::{
    IdentityGateway, LoginUpdate, MemoryStore, PushGateway, PushIdentity, PushRegistration,
    SecureStore, SessionManager, SessionRecord, SessionSettings, UserRole,
};

/// Push fake recording every remote call.
#[derive(Default)]
struct RecordingPush {
    registered: Mutex<Vec<PushRegistration>>,
    revoked: Mutex<Vec<(String, String)>>,
    notify: tokio::sync::Notify,
}

#[async_trait]
impl PushGateway for RecordingPush {
    async fn device_token(&self) -> okul_session::Result<String> {
        Ok("device-token-1".to_string())
    }

    async fn register(&self, registration: &PushRegistration) -> okul_session::Result<()> {
        self.registered.lock().unwrap().push(registration.clone());
        // notify_one stores a permit in case registration lands before
        // the test starts waiting.
        self.notify.notify_one();
        Ok(())
    }

    async fn revoke(&self, bearer_token: &str, device_token: &str) -> okul_session::Result<()> {
        self.revoked
            .lock()
            .unwrap()
            .push((bearer_token.to_string(), device_token.to_string()));
        Ok(())
    }
}

struct ProfileIdentity;

#[async_trait]
impl IdentityGateway for ProfileIdentity {
    async fn push_identity(&self, role: UserRole) -> okul_session::Result<PushIdentity> {
        Ok(PushIdentity {
            user_id: 7,
            user_type: role.push_category().to_string(),
        })
    }
}

fn manager_over(store: Arc<MemoryStore>) -> (SessionManager, Arc<RecordingPush>) {
    let push = Arc::new(RecordingPush::default());
    let manager = SessionManager::new(
        store,
        push.clone(),
        Arc::new(ProfileIdentity),
        &SessionSettings::default(),
    );
    (manager, push)
}

#[tokio::test]
async fn full_login_logout_scenario() {
    let store = Arc::new(MemoryStore::new());
    let (manager, push) = manager_over(store.clone());
    manager.restore().await;

    // Parent logs in with a profile payload.
    let record = manager
        .login(
            LoginUpdate::new("tok1", UserRole::Parent).with_user(json!({"OgrenciId": 7})),
        )
        .await
        .unwrap();

    assert!(record.authenticated);
    assert_eq!(record.role, Some(UserRole::Parent));

    // The detached registration task submits {token, user_id, user_type}.
    tokio::time::timeout(Duration::from_secs(1), push.notify.notified())
        .await
        .expect("push registration never ran");
    assert_eq!(
        *push.registered.lock().unwrap(),
        vec![PushRegistration {
            token: "device-token-1".to_string(),
            user_id: 7,
            user_type: "parent".to_string(),
        }]
    );

    manager.logout().await;

    // All storage keys cleared; the published record is fully reset.
    assert!(store.is_empty());
    assert_eq!(manager.current(), SessionRecord::signed_out());

    // Exactly one revoke, carrying the device token fetched before the
    // bearer was cleared.
    assert_eq!(
        *push.revoked.lock().unwrap(),
        vec![("tok1".to_string(), "device-token-1".to_string())]
    );
}

#[tokio::test]
async fn restore_after_restart_matches_storage_presence() {
    let store = Arc::new(MemoryStore::new());

    {
        let (manager, _push) = manager_over(store.clone());
        manager.restore().await;
        manager
            .login(LoginUpdate::new("tok1", UserRole::Teacher))
            .await
            .unwrap();
        manager.update_tenant("ist01", Some("photo.png")).await;
    }

    // "Process restart": a fresh manager over the same storage.
    let (manager, _push) = manager_over(store.clone());
    let record = manager.restore().await;

    assert!(record.authenticated);
    assert_eq!(record.role, Some(UserRole::Teacher));
    assert_eq!(record.tenant_code.as_deref(), Some("ist01"));
    assert_eq!(record.tenant_photo.as_deref(), Some("photo.png"));
}

#[tokio::test]
async fn tenant_selection_survives_restart_without_login() {
    let store = Arc::new(MemoryStore::new());

    {
        let (manager, _push) = manager_over(store.clone());
        manager.restore().await;
        manager.update_tenant("ist01", Some("photo.png")).await;
    }

    let (manager, _push) = manager_over(store);
    let record = manager.restore().await;

    assert!(!record.authenticated, "tenant alone never authenticates");
    assert_eq!(record.tenant_code.as_deref(), Some("ist01"));
}

#[tokio::test]
async fn logout_interrupted_by_restart_resolves_safely() {
    // Simulate a partially-cleared session: the token was deleted but the
    // role write survived (logout interrupted by process death).
    let store = Arc::new(MemoryStore::new());
    store.set("role", "parent").await.unwrap();
    store.set("schoolCode", "ist01").await.unwrap();

    let (manager, _push) = manager_over(store);
    let record = manager.restore().await;

    // authenticated is recomputed from presence, not a stored flag.
    assert!(!record.authenticated);
    assert_eq!(record.role, Some(UserRole::Parent));
    assert_eq!(record.tenant_code.as_deref(), Some("ist01"));
}

#[tokio::test]
async fn logout_twice_is_idempotent_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let (manager, push) = manager_over(store.clone());
    manager.restore().await;
    manager
        .login(LoginUpdate::new("tok1", UserRole::Admin))
        .await
        .unwrap();

    manager.logout().await;
    let first = manager.current();
    manager.logout().await;

    assert_eq!(manager.current(), first);
    assert_eq!(manager.current(), SessionRecord::signed_out());
    assert!(store.is_empty());
    // The second logout has no bearer, so no second revoke goes out.
    assert_eq!(push.revoked.lock().unwrap().len(), 1);
}
