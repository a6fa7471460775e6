//! Google Cloud Translation (v2 REST) provider.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::TranslationProvider;
use crate::{CoreError, config::ProviderConfig};

pub const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    source: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    data: Option<TranslateData>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}

/// Sends one request per leaf to the v2 `translate` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    env_hint: String,
}

impl GoogleTranslateProvider {
    pub fn new(endpoint: Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CoreError::provider(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            env_hint: "set GOOGLE_TRANSLATE_API_KEY".to_string(),
        })
    }

    /// Build from validated provider settings and an already resolved credential.
    pub fn from_config(config: &ProviderConfig, api_key: impl Into<String>) -> Result<Self> {
        let mut provider =
            Self::new(config.endpoint_url()?, api_key, Duration::from_secs(config.timeout_secs))?;
        provider.env_hint = format!(
            "create {} locally and set {}=xxx",
            config.env_file.display(),
            config.api_key_env
        );
        Ok(provider)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);
        url
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    async fn translate(&self, text: &str, target_lang: &str, source_lang: &str) -> Result<String> {
        let body =
            TranslateRequest { q: text, target: target_lang, source: source_lang, format: "text" };

        let response = self
            .client
            .post(self.request_url())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                // the request URL carries the API key
                let err = err.without_url();
                CoreError::provider(format!("request to {} failed: {err}", self.endpoint))
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| {
                let err = err.without_url();
                CoreError::provider(format!("failed to read response body: {err}"))
            })?;
        debug!(%status, target_lang, bytes = bytes.len(), "translation response received");

        let parsed = serde_json::from_slice::<TranslateResponse>(&bytes);

        if !status.is_success() {
            let upstream = parsed
                .ok()
                .and_then(|payload| payload.error)
                .and_then(|error| error.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(CoreError::provider(format!(
                "Google Cloud Translation API error ({status}): {upstream}\nPlease {}.",
                self.env_hint
            ))
            .into());
        }

        let payload = parsed
            .map_err(|err| CoreError::provider(format!("unparseable translation response: {err}")))?;
        payload
            .data
            .and_then(|data| data.translations.into_iter().next())
            .map(|translation| translation.translated_text)
            .ok_or_else(|| {
                CoreError::provider("translation response contained no translations").into()
            })
    }
}
