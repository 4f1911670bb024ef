//! Recursive translation of JSON documents.

use crate::error::TranslateError;
use crate::Translator;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Controls which parts of a document are sent for translation.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Object keys whose values are copied untouched, at any depth.
    pub skip_keys: HashSet<String>,
}

impl TranslateOptions {
    pub fn skip_key(mut self, key: impl Into<String>) -> Self {
        self.skip_keys.insert(key.into());
        self
    }

    fn skips(&self, key: &str) -> bool {
        self.skip_keys.contains(key)
    }
}

/// Translate every string leaf of `value` into `target`.
///
/// Objects and arrays keep their shape; numbers, booleans,
/// null and blank strings pass through. Leaves are translated one at a
/// time and the first failure aborts the walk.
pub fn translate_value<'a, T>(
    translator: &'a T,
    value: &'a Value,
    target: &'a str,
    options: &'a TranslateOptions,
) -> BoxFuture<'a, Result<Value, TranslateError>>
where
    T: Translator + ?Sized,
{
    async move {
        match value {
            Value::String(text) if text.trim().is_empty() => Ok(value.clone()),
            Value::String(text) => Ok(Value::String(translator.translate(text, target).await?)),
            Value::Array(items) => {
                let mut translated = Vec::with_capacity(items.len());
                for item in items {
                    translated.push(translate_value(translator, item, target, options).await?);
                }
                Ok(Value::Array(translated))
            }
            Value::Object(fields) => {
                let mut translated = Map::with_capacity(fields.len());
                for (key, field) in fields {
                    let field = if options.skips(key) {
                        field.clone()
                    } else {
                        translate_value(translator, field, target, options).await?
                    };
                    translated.insert(key.clone(), field);
                }
                Ok(Value::Object(translated))
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
        }
    }
    .boxed()
}

/// Number of string leaves `translate_value` would send to the API.
pub fn count_translatable(value: &Value, options: &TranslateOptions) -> usize {
    match value {
        Value::String(text) => usize::from(!text.trim().is_empty()),
        Value::Array(items) => items.iter().map(|v| count_translatable(v, options)).sum(),
        Value::Object(fields) => fields
            .iter()
            .filter(|(key, _)| !options.skips(key))
            .map(|(_, v)| count_translatable(v, options))
            .sum(),
        _ => 0,
    }
}
