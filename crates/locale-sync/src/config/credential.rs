//! Translation backend credential lookup.

use std::{fmt, fs, io, path::Path};

use anyhow::Result;
use tracing::debug;

use super::ProviderConfig;
use crate::error::CoreError;

/// Backend API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        ApiKey(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Resolve the API key: explicit flag, then the process environment value,
/// then a `KEY=VALUE` line in the provider's env file under `root`.
pub fn resolve_api_key(
    flag: Option<&str>,
    env_value: Option<&str>,
    provider: &ProviderConfig,
    root: &Path,
) -> Result<ApiKey> {
    if let Some(value) = non_empty(flag) {
        debug!("using API key from command line");
        return Ok(ApiKey::new(value));
    }
    if let Some(value) = non_empty(env_value) {
        debug!(env_key = %provider.api_key_env, "using API key from environment");
        return Ok(ApiKey::new(value));
    }

    let env_file = root.join(&provider.env_file);
    if let Some(value) = read_env_file_value(&env_file, &provider.api_key_env)? {
        debug!(path = %env_file.display(), "using API key from env file");
        return Ok(ApiKey::new(value));
    }

    Err(CoreError::CredentialMissing { env_key: provider.api_key_env.clone(), env_file }.into())
}

/// Look up `key` in a dotenv-style file. A missing file yields `None`.
pub fn read_env_file_value(path: &Path, key: &str) -> Result<Option<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(CoreError::EnvFileRead { path: path.to_path_buf(), source }.into()),
    };

    Ok(content
        .lines()
        .filter_map(parse_env_line)
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .next_back())
}

fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), unquote(value.trim()).to_string()))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
