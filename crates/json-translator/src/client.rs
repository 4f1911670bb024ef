//! HTTP translation client.

use crate::error::TranslateError;
use crate::types::*;
use crate::Translator;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Default retry configuration
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;
const DEFAULT_MAX_BACKOFF_MS: u64 = 5000;

const TRANSLATE_PATH: &str = "/language/translate/v2";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for a Google-Translate-v2-compatible API.
///
/// The API key is stored using `SecretString` to prevent accidental
/// exposure in logs or debug output.
#[derive(Clone)]
pub struct HttpTranslator {
    client: Client,
    base_url: String,
    api_key: SecretString,
    source: Option<String>,
    max_retries: u32,
}

impl HttpTranslator {
    /// Create a new translation client.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TranslateError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key.into()),
            source: None,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Pin the source language instead of letting the API detect it.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Translate one string, without retrying.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn translate_once(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        let request = TranslateRequest {
            q: text,
            target,
            source: self.source.as_deref(),
            format: "text",
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, TRANSLATE_PATH))
            .header(API_KEY_HEADER, self.api_key.expose_secret().as_str())
            .json(&request)
            .send()
            .await?;

        let body = self.handle_response::<TranslateResponse>(response).await?;

        body.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or(TranslateError::EmptyResponse)
    }

    /// Translate with automatic retry and exponential backoff.
    ///
    /// Retries transient errors (network issues, rate limits, 5xx) up to
    /// the configured number of times.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn translate_with_retry(
        &self,
        text: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let mut backoff_ms = DEFAULT_INITIAL_BACKOFF_MS;
        let mut attempt = 0;

        loop {
            match self.translate_once(text, target).await {
                Ok(translated) => return Ok(translated),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Translation request failed (attempt {}): {}", attempt, e);
                    debug!("Retrying after {}ms backoff", backoff_ms);
                    sleep(Duration::from_millis(backoff_ms)).await;
                    // Exponential backoff with cap
                    backoff_ms = (backoff_ms * 2).min(DEFAULT_MAX_BACKOFF_MS);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Handle HTTP response, converting errors appropriately.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, TranslateError> {
        if response.status().is_success() {
            let body = response.text().await?;
            debug!("Response body: {}", truncate(&body, 200));
            serde_json::from_str(&body).map_err(TranslateError::from)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract error information from failed response.
    async fn extract_error(&self, response: reqwest::Response) -> TranslateError {
        let status = response.status();

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Rate limit exceeded");
                TranslateError::RateLimit
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Authentication failed");
                TranslateError::Unauthorized
            }
            _ => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".into());
                let message = serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|b| b.error.message)
                    .unwrap_or(body);

                TranslateError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        self.translate_with_retry(text, target).await
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 2), "he");
        assert_eq!(truncate("привет", 3), "при");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client =
            HttpTranslator::new("key", "http://localhost:9999/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999");
        assert!(client.source().is_none());
    }

    #[tokio::test]
    async fn test_connection_error_hides_api_key() {
        let client =
            HttpTranslator::new("SUPER-SECRET-KEY", "http://127.0.0.1:1", Duration::from_secs(2))
                .unwrap()
                .with_max_retries(0);

        let err = client.translate("hello", "ru").await.unwrap_err();

        assert!(matches!(err, TranslateError::Http(_)));
        assert!(!err.to_string().contains("SUPER-SECRET-KEY"));
        assert!(!format!("{:?}", err).contains("SUPER-SECRET-KEY"));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(TranslateError::RateLimit.is_retryable());
        assert!(TranslateError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(!TranslateError::Api {
            status: 400,
            message: "bad target".into()
        }
        .is_retryable());
        assert!(!TranslateError::Unauthorized.is_retryable());
        assert!(!TranslateError::EmptyResponse.is_retryable());
    }
}
