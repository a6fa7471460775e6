//! `locale-sync.toml` configuration.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{error::CoreError, translate::google::DEFAULT_ENDPOINT};

mod credential;
mod language;

pub use credential::{ApiKey, read_env_file_value, resolve_api_key};
pub use language::LanguageTag;

/// Placeholder replaced by a language tag in namespace path templates.
pub const LANG_PLACEHOLDER: &str = "{lang}";

/// A named group of strings stored as one JSON file per language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespaceConfig {
    pub name: String,
    /// Path relative to the workspace root, containing `{lang}`.
    pub path: String,
}

impl NamespaceConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into() }
    }

    /// Relative file path for one language.
    pub fn file_for(&self, tag: &LanguageTag) -> PathBuf {
        PathBuf::from(self.path.replace(LANG_PLACEHOLDER, tag.as_str()))
    }
}

/// Translation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    pub endpoint: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Dotenv-style file, relative to the workspace root, consulted when the
    /// variable is not set.
    pub env_file: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: "GOOGLE_TRANSLATE_API_KEY".to_string(),
            env_file: PathBuf::from(".env.i18n"),
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    pub fn endpoint_url(&self) -> Result<Url> {
        let endpoint = self.endpoint.trim();
        Url::parse(endpoint).map_err(|source| {
            CoreError::ProviderEndpointInvalid { endpoint: endpoint.to_string(), source }.into()
        })
    }

    fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.timeout_secs == 0 {
            return Err(CoreError::ProviderTimeoutZero.into());
        }
        Ok(())
    }
}

/// Which trees to keep in sync and how to reach the translation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    pub source_language: LanguageTag,
    pub target_languages: Vec<LanguageTag>,
    pub namespaces: Vec<NamespaceConfig>,
    pub provider: ProviderConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let tag = LanguageTag::known;
        Self {
            source_language: tag("en-US"),
            target_languages: ["es-ES", "ja-JP", "vi-VN", "zh-CN"].into_iter().map(tag).collect(),
            namespaces: vec![
                NamespaceConfig::new("main", "src/locales/{lang}.json"),
                NamespaceConfig::new("sql-review", "src/locales/sql-review/{lang}.json"),
            ],
            provider: ProviderConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| CoreError::ConfigRead { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content, path)
    }

    /// Like [`SyncConfig::from_file`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content, path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(source) => Err(CoreError::ConfigRead { path: path.to_path_buf(), source }.into()),
        }
    }

    fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        let mut config: SyncConfig = toml_edit::de::from_str(content)
            .map_err(|source| CoreError::ConfigParse { path: path.to_path_buf(), source })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml_edit::ser::to_string_pretty(self)
            .map_err(|source| CoreError::ConfigSerialise { source }.into())
    }

    fn normalize(&mut self) {
        self.source_language = self.source_language.trimmed();
        for tag in &mut self.target_languages {
            *tag = tag.trimmed();
        }
        for namespace in &mut self.namespaces {
            namespace.name = namespace.name.trim().to_string();
            namespace.path = namespace.path.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.source_language.check()?;

        if self.target_languages.is_empty() {
            return Err(CoreError::NoTargetLanguages.into());
        }
        let mut seen = HashSet::new();
        for tag in &self.target_languages {
            tag.check()?;
            if tag.matches(self.source_language.as_str()) {
                return Err(CoreError::TargetIsSource { tag: tag.to_string() }.into());
            }
            if !seen.insert(tag.as_str().replace('_', "-").to_ascii_lowercase()) {
                return Err(CoreError::DuplicateTargetLanguage { tag: tag.to_string() }.into());
            }
        }

        let mut names = HashSet::new();
        for namespace in &self.namespaces {
            if namespace.name.is_empty() {
                return Err(CoreError::NamespaceNameEmpty.into());
            }
            if !names.insert(namespace.name.as_str()) {
                return Err(CoreError::DuplicateNamespace { name: namespace.name.clone() }.into());
            }
            if !namespace.path.contains(LANG_PLACEHOLDER) {
                return Err(CoreError::PathTemplateMissingPlaceholder {
                    name: namespace.name.clone(),
                    template: namespace.path.clone(),
                }
                .into());
            }
        }

        self.provider.validate()
    }

    /// Namespaces to process, in config order. An empty filter selects all.
    pub fn select_namespaces(&self, filter: &[String]) -> Result<Vec<&NamespaceConfig>> {
        for name in filter {
            if !self.namespaces.iter().any(|namespace| namespace.name == name.trim()) {
                return Err(CoreError::UnknownNamespace { name: name.clone() }.into());
            }
        }
        Ok(self
            .namespaces
            .iter()
            .filter(|namespace| {
                filter.is_empty() || filter.iter().any(|name| name.trim() == namespace.name)
            })
            .collect())
    }

    /// Target languages to process, in config order. An empty filter selects all.
    pub fn select_targets(&self, filter: &[String]) -> Result<Vec<&LanguageTag>> {
        for raw in filter {
            if !self.target_languages.iter().any(|tag| tag.matches(raw)) {
                return Err(CoreError::UnknownLanguage { tag: raw.clone() }.into());
            }
        }
        Ok(self
            .target_languages
            .iter()
            .filter(|tag| filter.is_empty() || filter.iter().any(|raw| tag.matches(raw)))
            .collect())
    }
}
