//! In-memory pending signup storage with TTL expiration.

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::VerifyError;
use crate::types::{PendingRegistration, RegistrationPatch, UserData};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

type Entries = HashMap<String, PendingRegistration>;

/// Pending registrations keyed by phone number.
///
/// Entries expire a fixed TTL after creation. Expiry is checked on every
/// access, and [`SessionSweeper`](crate::SessionSweeper) additionally
/// drops abandoned entries in the background. Nothing is persisted.
#[derive(Clone)]
pub struct TempSessionStore {
    entries: Arc<RwLock<Entries>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TempSessionStore {
    /// Create a store backed by the system clock.
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store that reads time from `clock`.
    pub fn with_clock(config: &StoreConfig, clock: Arc<dyn Clock>) -> Self {
        info!("Pending signup store initialized (ttl={:?})", config.ttl);

        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: config.ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Store a new pending registration, replacing any existing one.
    ///
    /// Returns the freshly generated session id.
    #[instrument(skip(self, user_data))]
    pub async fn put(&self, phone: &str, user_data: UserData) -> String {
        let now = self.clock.now();
        let expires_at = add_duration(now, self.ttl);
        let session_id = generate_session_id(now);

        let entry = PendingRegistration::new(phone, session_id.clone(), user_data, now, expires_at);

        let mut entries = self.entries.write().await;
        if let Some(previous) = entries.insert(phone.to_string(), entry) {
            if previous.verified && !previous.is_expired(now) {
                warn!(phone = %phone, "Replaced a verified pending registration");
            } else {
                debug!(phone = %phone, "Replaced pending registration");
            }
        }

        session_id
    }

    /// Get the live entry for a phone, dropping it if it has expired.
    #[instrument(skip(self))]
    pub async fn get(&self, phone: &str) -> Option<PendingRegistration> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            match entries.get(phone) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        live_entry(&mut entries, phone, now).cloned()
    }

    /// Merge `patch` into the live entry for a phone.
    ///
    /// Returns false if there is no live entry.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, phone: &str, patch: RegistrationPatch) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        match live_entry(&mut entries, phone, now) {
            Some(entry) => {
                entry.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Attach a verification code and its deadline to the live entry.
    pub async fn set_verification_code(
        &self,
        phone: &str,
        code: &str,
        code_expires_at: DateTime<Utc>,
    ) -> bool {
        self.update(phone, RegistrationPatch::verification_code(code, code_expires_at))
            .await
    }

    /// Check a supplied code against the live entry.
    ///
    /// On success the entry is marked verified and returned. The entry is
    /// not removed; the caller does that once the user is persisted.
    #[instrument(skip(self, supplied))]
    pub async fn verify_code(
        &self,
        phone: &str,
        supplied: &str,
    ) -> Result<PendingRegistration, VerifyError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;

        let entry = live_entry(&mut entries, phone, now).ok_or(VerifyError::NotFound)?;

        let expected = entry
            .verification_code
            .as_deref()
            .ok_or(VerifyError::NoCodeIssued)?;

        if entry.is_code_expired(now) {
            return Err(VerifyError::CodeExpired);
        }

        if supplied != expected {
            return Err(VerifyError::CodeMismatch);
        }

        entry.verified = true;
        debug!(phone = %phone, "Verification code accepted");

        Ok(entry.clone())
    }

    /// Delete the entry for a phone. Returns whether one existed.
    #[instrument(skip(self))]
    pub async fn remove(&self, phone: &str) -> bool {
        let removed = self.entries.write().await.remove(phone).is_some();

        if removed {
            debug!(phone = %phone, "Removed pending registration");
        }

        removed
    }

    /// Delete the entry for a phone only if it still belongs to `session_id`.
    ///
    /// A newer `put` for the same phone is left in place.
    #[instrument(skip(self))]
    pub async fn remove_if_session(&self, phone: &str, session_id: &str) -> bool {
        let mut entries = self.entries.write().await;

        match entries.get(phone) {
            Some(entry) if entry.session_id == session_id => {
                entries.remove(phone);
                debug!(phone = %phone, "Removed pending registration");
                true
            }
            Some(_) => {
                debug!(phone = %phone, "Pending registration was replaced; keeping newer entry");
                false
            }
            None => false,
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before_count = entries.len();

        entries.retain(|_, entry| !entry.is_expired(now));

        let removed = before_count - entries.len();
        if removed > 0 {
            debug!("Swept {} expired pending registrations", removed);
        }

        removed
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Number of entries that have not expired.
    pub async fn live_count(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }
}

/// Live entry lookup that evicts the entry if it has expired.
fn live_entry<'a>(
    entries: &'a mut Entries,
    phone: &str,
    now: DateTime<Utc>,
) -> Option<&'a mut PendingRegistration> {
    if entries.get(phone).is_some_and(|entry| entry.is_expired(now)) {
        entries.remove(phone);
        debug!(phone = %phone, "Evicted expired pending registration");
        return None;
    }

    entries.get_mut(phone)
}

fn add_duration(at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| at.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time-prefixed random token, e.g. `18f3a2b9c40-9f86d081884c7d65`.
fn generate_session_id(now: DateTime<Utc>) -> String {
    let random: [u8; 8] = rand::random();
    format!("{:x}-{}", now.timestamp_millis(), hex::encode(random))
}
