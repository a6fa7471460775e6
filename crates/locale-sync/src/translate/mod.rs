//! Leaf translation capability and the recursive value translator built on it.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures_core::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::trace;

pub mod google;

pub use google::GoogleTranslateProvider;

/// Language the source trees are written in unless told otherwise.
pub const DEFAULT_SOURCE_LANG: &str = "en";

/// Translates a single piece of text.
///
/// Implementations report failures as [`crate::CoreError::Provider`].
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str, source_lang: &str) -> Result<String>;
}

#[async_trait]
impl<T: TranslationProvider + ?Sized> TranslationProvider for Arc<T> {
    async fn translate(&self, text: &str, target_lang: &str, source_lang: &str) -> Result<String> {
        (**self).translate(text, target_lang, source_lang).await
    }
}

#[async_trait]
impl<T: TranslationProvider + ?Sized> TranslationProvider for &T {
    async fn translate(&self, text: &str, target_lang: &str, source_lang: &str) -> Result<String> {
        (**self).translate(text, target_lang, source_lang).await
    }
}

/// Translates every string leaf of a value, keeping its shape.
///
/// Leaves are translated one at a time in document order; each provider call
/// completes before the next one starts. Numbers, booleans and nulls are
/// returned as they are and never reach the provider.
#[derive(Debug, Clone)]
pub struct ValueTranslator<P> {
    provider: P,
    source_lang: String,
}

impl<P: TranslationProvider> ValueTranslator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, source_lang: DEFAULT_SOURCE_LANG.to_string() }
    }

    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = source_lang.into();
        self
    }

    pub async fn translate(&self, value: &Value, target_lang: &str) -> Result<Value> {
        self.translate_value(value, target_lang).await
    }

    fn translate_value<'a>(
        &'a self,
        value: &'a Value,
        target_lang: &'a str,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            match value {
                Value::String(text) => {
                    trace!(target_lang, source_lang = %self.source_lang, "translating leaf");
                    let translated =
                        self.provider.translate(text, target_lang, &self.source_lang).await?;
                    Ok(Value::String(translated))
                }
                Value::Array(items) => {
                    let mut translated = Vec::with_capacity(items.len());
                    for item in items {
                        translated.push(self.translate_value(item, target_lang).await?);
                    }
                    Ok(Value::Array(translated))
                }
                Value::Object(map) => {
                    let mut translated = Map::with_capacity(map.len());
                    for (key, item) in map {
                        let item = self.translate_value(item, target_lang).await?;
                        translated.insert(key.clone(), item);
                    }
                    Ok(Value::Object(translated))
                }
                Value::Number(_) | Value::Bool(_) | Value::Null => Ok(value.clone()),
            }
        })
    }
}
