//! End-to-end pending signup scenarios against the public API.

use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;
use signup_store::{
    Clock, ManualClock, SignupConfig, SignupError, SignupFlow, SmsSender, StoreConfig,
    TempSessionStore, UserData, UserRepository, VerifyError, VerifyOutcome,
};
use std::sync::{Arc, Mutex};

const PHONE: &str = "+998901234567";

/// Records every code instead of texting it.
#[derive(Clone, Default)]
struct RecordingSms {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSms {
    fn last_code(&self) -> String {
        self.sent.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send_code(&self, phone: &str, code: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), code.to_string()));
        Ok(())
    }
}

/// Keeps created users in a vector.
#[derive(Clone, Default)]
struct InMemoryUsers {
    users: Arc<Mutex<Vec<(String, UserData)>>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create_user(&self, phone: &str, user_data: &UserData) -> anyhow::Result<String> {
        let mut users = self.users.lock().unwrap();
        users.push((phone.to_string(), user_data.clone()));
        Ok(format!("user-{}", users.len()))
    }
}

/// Persists the user while a second signup for the same phone starts.
struct OverlappingSignupUsers {
    store: TempSessionStore,
}

#[async_trait]
impl UserRepository for OverlappingSignupUsers {
    async fn create_user(&self, phone: &str, _user_data: &UserData) -> anyhow::Result<String> {
        self.store.put(phone, password_hash("second")).await;
        Ok("user-1".to_string())
    }
}

/// Fails to deliver after a second signup for the same phone has started.
struct OverlappingSignupSms {
    store: TempSessionStore,
}

#[async_trait]
impl SmsSender for OverlappingSignupSms {
    async fn send_code(&self, phone: &str, _code: &str) -> anyhow::Result<()> {
        self.store.put(phone, password_hash("second")).await;
        anyhow::bail!("gateway timeout")
    }
}

fn password_hash(hash: &str) -> UserData {
    json!({ "password_hash": hash }).as_object().cloned().unwrap()
}

fn manual_store() -> (TempSessionStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let store = TempSessionStore::with_clock(&StoreConfig::default(), clock.clone());
    (store, clock)
}

#[tokio::test]
async fn test_code_expires_before_entry() {
    let (store, clock) = manual_store();

    store.put(PHONE, password_hash("abc")).await;
    assert!(
        store
            .set_verification_code(PHONE, "4821", clock.now() + Duration::seconds(300))
            .await
    );

    clock.advance(Duration::seconds(301));

    let outcome = VerifyOutcome::from(store.verify_code(PHONE, "4821").await);
    assert!(!outcome.success);
    assert_eq!(outcome.reason, Some("code expired"));
}

#[tokio::test]
async fn test_verification_reasons_in_order() {
    let (store, clock) = manual_store();

    assert_eq!(
        store.verify_code(PHONE, "4821").await,
        Err(VerifyError::NotFound)
    );

    store.put(PHONE, password_hash("abc")).await;
    assert_eq!(
        store.verify_code(PHONE, "4821").await,
        Err(VerifyError::NoCodeIssued)
    );

    store
        .set_verification_code(PHONE, "4821", clock.now() + Duration::minutes(5))
        .await;
    assert_eq!(
        store.verify_code(PHONE, "0000").await,
        Err(VerifyError::CodeMismatch)
    );

    let entry = store.verify_code(PHONE, "4821").await.unwrap();
    assert!(entry.verified);
    assert_eq!(entry.user_data["password_hash"], "abc");
}

#[tokio::test]
async fn test_full_signup_flow() {
    let (store, _) = manual_store();
    let sms = RecordingSms::default();
    let users = InMemoryUsers::default();

    let flow = SignupFlow::new(
        store.clone(),
        sms.clone(),
        users.clone(),
        SignupConfig::default(),
    );

    let started = flow.start(PHONE, password_hash("abc")).await.unwrap();
    assert_eq!(started.phone, PHONE);
    assert_eq!(
        store.get(PHONE).await.unwrap().session_id,
        started.session_id
    );

    let user_id = flow.confirm(PHONE, &sms.last_code()).await.unwrap();
    assert_eq!(user_id, "user-1");

    assert!(store.get(PHONE).await.is_none());
    let created = users.users.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, PHONE);
    assert_eq!(created[0].1["password_hash"], "abc");
}

#[tokio::test]
async fn test_signup_abandoned_past_ttl() {
    let (store, clock) = manual_store();
    let sms = RecordingSms::default();

    let flow = SignupFlow::new(
        store.clone(),
        sms.clone(),
        InMemoryUsers::default(),
        SignupConfig::default(),
    );

    flow.start(PHONE, password_hash("abc")).await.unwrap();
    clock.advance(Duration::minutes(31));

    let err = flow.confirm(PHONE, &sms.last_code()).await.unwrap_err();
    assert!(matches!(err, SignupError::Verification(VerifyError::NotFound)));

    let err = flow.resend_code(PHONE).await.unwrap_err();
    assert!(matches!(err, SignupError::NotFound(_)));
}

#[tokio::test]
async fn test_system_clock_store() {
    let store = TempSessionStore::new(&StoreConfig::default());

    let session_id = store.put(PHONE, UserData::new()).await;
    assert!(!session_id.is_empty());
    assert_eq!(store.live_count().await, 1);
    assert_eq!(store.sweep_expired().await, 0);
}

#[tokio::test]
async fn test_confirm_keeps_newer_signup_for_same_phone() {
    let (store, _) = manual_store();
    let sms = RecordingSms::default();

    let flow = SignupFlow::new(
        store.clone(),
        sms.clone(),
        OverlappingSignupUsers {
            store: store.clone(),
        },
        SignupConfig::default(),
    );

    let started = flow.start(PHONE, password_hash("first")).await.unwrap();
    assert_eq!(flow.confirm(PHONE, &sms.last_code()).await.unwrap(), "user-1");

    let pending = store.get(PHONE).await.unwrap();
    assert_ne!(pending.session_id, started.session_id);
    assert_eq!(pending.user_data["password_hash"], "second");
    assert!(!pending.verified);
}

#[tokio::test]
async fn test_sms_failure_keeps_newer_signup_for_same_phone() {
    let (store, _) = manual_store();

    let flow = SignupFlow::new(
        store.clone(),
        OverlappingSignupSms {
            store: store.clone(),
        },
        InMemoryUsers::default(),
        SignupConfig::default(),
    );

    let err = flow.start(PHONE, password_hash("first")).await.unwrap_err();
    assert!(matches!(err, SignupError::Sms(_)));

    let pending = store.get(PHONE).await.unwrap();
    assert_eq!(pending.user_data["password_hash"], "second");
}
