//! Request and response types for the translation API.

use serde::{Deserialize, Serialize};

/// Translate request body.
#[derive(Debug, Clone, Serialize)]
pub struct TranslateRequest<'a> {
    pub q: &'a str,
    pub target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    pub format: &'static str,
}

/// Translate response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslateResponse {
    pub data: TranslationData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationData {
    #[serde(default)]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}
