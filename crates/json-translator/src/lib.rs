//! Field-by-field translation of nested JSON documents.
//!
//! Walks a document and sends every string leaf through a [`Translator`],
//! rebuilding the same structure with translated text.

mod client;
mod config;
mod error;
mod types;
mod walk;

pub use client::HttpTranslator;
pub use config::TranslatorConfig;
pub use error::TranslateError;
pub use types::*;
pub use walk::{count_translatable, translate_value, TranslateOptions};

use async_trait::async_trait;

/// Translates a single piece of text.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError>;
}
