use std::{
    io,
    path::{Path, PathBuf},
};

use serde_json::Error as JsonError;
use thiserror::Error;
use toml_edit::{de::Error as TomlDeError, ser::Error as TomlSerError};
use url::ParseError as UrlParseError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read config file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: TomlDeError,
    },

    #[error("failed to serialise config to TOML")]
    ConfigSerialise {
        #[source]
        source: TomlSerError,
    },

    #[error("invalid language tag '{tag}'")]
    InvalidLanguageTag { tag: String },

    #[error("at least one target language is required")]
    NoTargetLanguages,

    #[error("target language '{tag}' is the source language")]
    TargetIsSource { tag: String },

    #[error("target language '{tag}' is listed more than once")]
    DuplicateTargetLanguage { tag: String },

    #[error("namespace name cannot be empty")]
    NamespaceNameEmpty,

    #[error("namespace '{name}' is listed more than once")]
    DuplicateNamespace { name: String },

    #[error("path template '{template}' for namespace '{name}' has no {{lang}} placeholder")]
    PathTemplateMissingPlaceholder { name: String, template: String },

    #[error("invalid translation endpoint '{endpoint}'")]
    ProviderEndpointInvalid {
        endpoint: String,
        #[source]
        source: UrlParseError,
    },

    #[error("translation request timeout must be greater than zero")]
    ProviderTimeoutZero,

    #[error("translation API key not found (set {env_key} or add it to {env_file})")]
    CredentialMissing { env_key: String, env_file: PathBuf },

    #[error("failed to read env file {path}")]
    EnvFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("namespace '{name}' is not configured")]
    UnknownNamespace { name: String },

    #[error("language '{tag}' is not a configured target language")]
    UnknownLanguage { tag: String },

    #[error("translation failed: {message}")]
    Provider { message: String },

    #[error("source tree {path} is missing or unreadable")]
    SourceTreeUnavailable { path: PathBuf },

    #[error("failed to create directory {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialise tree for {path}")]
    SerialiseTree {
        path: PathBuf,
        #[source]
        source: JsonError,
    },

    #[error("failed to write {path}")]
    WriteTree {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Coarse classification of failures, used to decide how far an error travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid setup; aborts before any merge begins.
    Config,
    /// A translation call failed; aborts the in-flight merge.
    Provider,
    /// A tree could not be loaded.
    Read,
    /// A tree could not be persisted; reported per file.
    Write,
}

impl CoreError {
    pub fn provider(message: impl Into<String>) -> Self {
        CoreError::Provider { message: message.into() }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::Provider { .. } => ErrorClass::Provider,
            CoreError::SourceTreeUnavailable { .. } => ErrorClass::Read,
            CoreError::CreateDirectory { .. }
            | CoreError::SerialiseTree { .. }
            | CoreError::WriteTree { .. } => ErrorClass::Write,
            _ => ErrorClass::Config,
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            CoreError::ConfigRead { .. } => "core.config_read_failed",
            CoreError::ConfigParse { .. } => "core.config_parse_failed",
            CoreError::ConfigSerialise { .. } => "core.config_serialise_failed",
            CoreError::InvalidLanguageTag { .. } => "core.invalid_language_tag",
            CoreError::NoTargetLanguages => "core.no_target_languages",
            CoreError::TargetIsSource { .. } => "core.target_is_source",
            CoreError::DuplicateTargetLanguage { .. } => "core.duplicate_target_language",
            CoreError::NamespaceNameEmpty => "core.namespace_name_empty",
            CoreError::DuplicateNamespace { .. } => "core.duplicate_namespace",
            CoreError::PathTemplateMissingPlaceholder { .. } => "core.path_template_placeholder",
            CoreError::ProviderEndpointInvalid { .. } => "core.provider_endpoint_invalid",
            CoreError::ProviderTimeoutZero => "core.provider_timeout_zero",
            CoreError::CredentialMissing { .. } => "core.credential_missing",
            CoreError::EnvFileRead { .. } => "core.env_file_read_failed",
            CoreError::UnknownNamespace { .. } => "core.unknown_namespace",
            CoreError::UnknownLanguage { .. } => "core.unknown_language",
            CoreError::Provider { .. } => "core.provider_failed",
            CoreError::SourceTreeUnavailable { .. } => "core.source_tree_unavailable",
            CoreError::CreateDirectory { .. } => "core.create_dir_failed",
            CoreError::SerialiseTree { .. } => "core.serialise_tree_failed",
            CoreError::WriteTree { .. } => "core.write_tree_failed",
        }
    }

    pub fn placeholders(&self) -> Vec<(&'static str, String)> {
        match self {
            CoreError::ConfigRead { path, source }
            | CoreError::EnvFileRead { path, source }
            | CoreError::CreateDirectory { path, source }
            | CoreError::WriteTree { path, source } => {
                vec![("path", display_path(path)), ("error", source.to_string())]
            }
            CoreError::ConfigParse { path, source } => {
                vec![("path", display_path(path)), ("error", source.to_string())]
            }
            CoreError::SerialiseTree { path, source } => {
                vec![("path", display_path(path)), ("error", source.to_string())]
            }
            CoreError::ConfigSerialise { source } => vec![("error", source.to_string())],
            CoreError::InvalidLanguageTag { tag }
            | CoreError::TargetIsSource { tag }
            | CoreError::DuplicateTargetLanguage { tag }
            | CoreError::UnknownLanguage { tag } => vec![("tag", tag.clone())],
            CoreError::DuplicateNamespace { name } | CoreError::UnknownNamespace { name } => {
                vec![("name", name.clone())]
            }
            CoreError::PathTemplateMissingPlaceholder { name, template } => {
                vec![("name", name.clone()), ("template", template.clone())]
            }
            CoreError::ProviderEndpointInvalid { endpoint, source } => {
                vec![("endpoint", endpoint.clone()), ("error", source.to_string())]
            }
            CoreError::CredentialMissing { env_key, env_file } => {
                vec![("env_key", env_key.clone()), ("env_file", display_path(env_file))]
            }
            CoreError::Provider { message } => vec![("error", message.clone())],
            CoreError::SourceTreeUnavailable { path } => vec![("path", display_path(path))],
            CoreError::NoTargetLanguages
            | CoreError::NamespaceNameEmpty
            | CoreError::ProviderTimeoutZero => Vec::new(),
        }
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
