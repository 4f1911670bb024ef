//! Signup store errors.

use thiserror::Error;

/// Why a verification code was rejected.
///
/// Checks run in declaration order and stop at the first failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("not found")]
    NotFound,

    #[error("no code issued")]
    NoCodeIssued,

    #[error("code expired")]
    CodeExpired,

    #[error("code mismatch")]
    CodeMismatch,
}

impl VerifyError {
    /// Stable reason string surfaced to end users.
    pub fn reason(&self) -> &'static str {
        match self {
            VerifyError::NotFound => "not found",
            VerifyError::NoCodeIssued => "no code issued",
            VerifyError::CodeExpired => "code expired",
            VerifyError::CodeMismatch => "code mismatch",
        }
    }
}

/// Signup flow errors.
#[derive(Error, Debug)]
pub enum SignupError {
    #[error("Invalid phone number format: {0}")]
    InvalidPhoneNumber(String),

    #[error("No pending registration for {0}")]
    NotFound(String),

    #[error("Verification failed: {0}")]
    Verification(#[from] VerifyError),

    #[error("SMS delivery failed: {0}")]
    Sms(String),

    #[error("Persisting user failed: {0}")]
    Persistence(String),
}

impl SignupError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            SignupError::InvalidPhoneNumber(_) => "INVALID_PHONE_NUMBER",
            SignupError::NotFound(_) => "NOT_FOUND",
            SignupError::Verification(VerifyError::NotFound) => "NOT_FOUND",
            SignupError::Verification(VerifyError::NoCodeIssued) => "NO_CODE_ISSUED",
            SignupError::Verification(VerifyError::CodeExpired) => "CODE_EXPIRED",
            SignupError::Verification(VerifyError::CodeMismatch) => "CODE_MISMATCH",
            SignupError::Sms(_) => "SMS_ERROR",
            SignupError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}
