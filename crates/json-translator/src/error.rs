//! Translation errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication failed")]
    Unauthorized,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty response from translation service")]
    EmptyResponse,
}

impl From<reqwest::Error> for TranslateError {
    // Request URLs never reach logs or error chains
    fn from(e: reqwest::Error) -> Self {
        TranslateError::Http(e.without_url())
    }
}

impl TranslateError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Http(_) | TranslateError::RateLimit => true,
            TranslateError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
