//! Pending registration types.

use crate::error::VerifyError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form fields supplied at registration time (password hash, name, ...).
pub type UserData = Map<String, Value>;

/// A signup attempt awaiting phone verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRegistration {
    /// Phone number this entry is keyed by.
    pub phone: String,

    /// Opaque token for client-side correlation.
    pub session_id: String,

    /// Caller-supplied payload, not validated.
    #[serde(default)]
    pub user_data: UserData,

    /// Most recently issued verification code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,

    /// Instant after which `verification_code` is rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_expires_at: Option<DateTime<Utc>>,

    /// Set once a code check succeeds.
    pub verified: bool,

    pub created_at: DateTime<Utc>,

    /// Instant after which the whole entry is gone.
    pub expires_at: DateTime<Utc>,
}

impl PendingRegistration {
    pub fn new(
        phone: impl Into<String>,
        session_id: impl Into<String>,
        user_data: UserData,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            phone: phone.into(),
            session_id: session_id.into(),
            user_data,
            verification_code: None,
            verification_expires_at: None,
            verified: false,
            created_at,
            expires_at,
        }
    }

    /// Whether the entry has outlived its TTL at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the current code (if any) has lapsed at `now`.
    pub fn is_code_expired(&self, now: DateTime<Utc>) -> bool {
        self.verification_expires_at
            .map(|deadline| now > deadline)
            .unwrap_or(false)
    }

    /// Merge a partial update into this entry.
    pub fn apply(&mut self, patch: RegistrationPatch) {
        if let Some(code) = patch.verification_code {
            self.verification_code = Some(code);
        }
        if let Some(deadline) = patch.verification_expires_at {
            self.verification_expires_at = Some(deadline);
        }
        self.user_data.extend(patch.user_data);
    }
}

/// Partial update for a live entry.
///
/// Identity and lifecycle fields are deliberately absent: `phone`,
/// `session_id`, `created_at`, `expires_at` and `verified` cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_data: UserData,
}

impl RegistrationPatch {
    /// Patch that installs a new code and its deadline.
    pub fn verification_code(code: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            verification_code: Some(code.into()),
            verification_expires_at: Some(expires_at),
            user_data: UserData::new(),
        }
    }

    /// Add a user data field to merge.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.user_data.insert(key.into(), value.into());
        self
    }
}

/// Wire shape of a verification attempt: `{success, reason}` or `{success, entry}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<PendingRegistration>,
}

impl From<Result<PendingRegistration, VerifyError>> for VerifyOutcome {
    fn from(result: Result<PendingRegistration, VerifyError>) -> Self {
        match result {
            Ok(entry) => Self {
                success: true,
                reason: None,
                entry: Some(entry),
            },
            Err(e) => Self {
                success: false,
                reason: Some(e.reason()),
                entry: None,
            },
        }
    }
}
