//! Phone-verified signup flow built on [`TempSessionStore`].
//!
//! `start` → SMS → `confirm` → durable user; the pending entry is removed
//! only once the user has been persisted.

use crate::config::{SignupConfig, MAX_CODE_LENGTH, MIN_CODE_LENGTH};
use crate::error::SignupError;
use crate::phone::normalize_phone_number;
use crate::store::TempSessionStore;
use crate::types::UserData;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

/// Delivers verification codes to a phone.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_code(&self, phone: &str, code: &str) -> anyhow::Result<()>;
}

/// Durable user storage that verified signups are promoted into.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create the permanent user record, returning its id.
    async fn create_user(&self, phone: &str, user_data: &UserData) -> anyhow::Result<String>;
}

/// Result of starting a signup.
#[derive(Debug, Clone, Serialize)]
pub struct StartedSignup {
    pub phone: String,
    pub session_id: String,
    pub code_expires_at: DateTime<Utc>,
}

/// Orchestrates a multi-step phone verification signup.
pub struct SignupFlow<S, U> {
    store: TempSessionStore,
    sms: S,
    users: U,
    config: SignupConfig,
}

impl<S: SmsSender, U: UserRepository> SignupFlow<S, U> {
    /// `config.code_length` is clamped to the supported range, so a
    /// misconfigured length can never produce an empty code.
    pub fn new(store: TempSessionStore, sms: S, users: U, mut config: SignupConfig) -> Self {
        let code_length = config.code_length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH);
        if code_length != config.code_length {
            warn!(
                "Verification code length {} out of range, using {}",
                config.code_length, code_length
            );
            config.code_length = code_length;
        }

        Self {
            store,
            sms,
            users,
            config,
        }
    }

    pub fn store(&self) -> &TempSessionStore {
        &self.store
    }

    /// Record a pending registration and text the phone a code.
    #[instrument(skip(self, user_data))]
    pub async fn start(
        &self,
        phone: &str,
        user_data: UserData,
    ) -> Result<StartedSignup, SignupError> {
        let phone = normalize_phone_number(phone).map_err(SignupError::InvalidPhoneNumber)?;
        info!(phone = %phone, "Signup started");

        let session_id = self.store.put(&phone, user_data).await;

        match self.issue_code(&phone).await {
            Ok(code_expires_at) => Ok(StartedSignup {
                phone,
                session_id,
                code_expires_at,
            }),
            Err(e) => {
                self.store.remove_if_session(&phone, &session_id).await;
                Err(e)
            }
        }
    }

    /// Issue a fresh code for an existing pending registration.
    #[instrument(skip(self))]
    pub async fn resend_code(&self, phone: &str) -> Result<DateTime<Utc>, SignupError> {
        let phone = normalize_phone_number(phone).map_err(SignupError::InvalidPhoneNumber)?;

        if self.store.get(&phone).await.is_none() {
            return Err(SignupError::NotFound(phone));
        }

        self.issue_code(&phone).await
    }

    /// Check the code, persist the user and drop the pending entry.
    ///
    /// Returns the id of the created user.
    #[instrument(skip(self, code))]
    pub async fn confirm(&self, phone: &str, code: &str) -> Result<String, SignupError> {
        let phone = normalize_phone_number(phone).map_err(SignupError::InvalidPhoneNumber)?;

        let entry = self.store.verify_code(&phone, code).await.map_err(|e| {
            warn!(phone = %phone, reason = e.reason(), "Verification rejected");
            SignupError::from(e)
        })?;

        let user_id = self
            .users
            .create_user(&phone, &entry.user_data)
            .await
            .map_err(|e| {
                error!(phone = %phone, "Failed to persist verified user: {:#}", e);
                SignupError::Persistence(format!("{:#}", e))
            })?;

        self.store
            .remove_if_session(&phone, &entry.session_id)
            .await;
        info!(phone = %phone, user_id = %user_id, "Signup completed");

        Ok(user_id)
    }

    async fn issue_code(&self, phone: &str) -> Result<DateTime<Utc>, SignupError> {
        let code = generate_code(self.config.code_length);
        let code_ttl = chrono::Duration::from_std(self.config.code_ttl)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let code_expires_at = self.store.now() + code_ttl;

        if !self
            .store
            .set_verification_code(phone, &code, code_expires_at)
            .await
        {
            return Err(SignupError::NotFound(phone.to_string()));
        }

        self.sms.send_code(phone, &code).await.map_err(|e| {
            error!(phone = %phone, "Failed to send verification code: {:#}", e);
            SignupError::Sms(format!("{:#}", e))
        })?;

        Ok(code_expires_at)
    }
}

/// Random numeric code of `length` digits.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
