//! Filesystem layout helpers for a localization workspace.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::{LanguageTag, NamespaceConfig};

/// Environment variable that overrides the default workspace root.
const ROOT_ENV_KEY: &str = "LOCALE_SYNC_ROOT";
pub const CONFIG_FILE_NAME: &str = "locale-sync.toml";

/// Descriptor for the workspace directory structure.
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
    config_path: PathBuf,
}

impl Layout {
    /// Construct a new layout without touching the filesystem.
    pub fn new(root: PathBuf) -> Self {
        let config_path = root.join(CONFIG_FILE_NAME);
        Self { root, config_path }
    }

    /// Use a config file outside the default location. Relative paths are
    /// taken relative to the root.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = self.resolve(path);
        self
    }

    /// Workspace root directory; namespace templates are relative to it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Path to the tree file of one namespace in one language.
    pub fn tree_path(&self, namespace: &NamespaceConfig, tag: &LanguageTag) -> PathBuf {
        self.resolve(namespace.file_for(tag))
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() { path } else { self.root.join(path) }
    }
}

/// Determine the default workspace root: `LOCALE_SYNC_ROOT`, else the current directory.
pub fn default_root() -> Result<PathBuf> {
    if let Ok(value) = env::var(ROOT_ENV_KEY) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    env::current_dir().context("failed to determine the current directory")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: PathBuf) -> Result<PathBuf> {
    if let Some(str_path) = path.to_str() {
        if let Some(stripped) = str_path.strip_prefix('~') {
            let home = user_home_dir().context("cannot expand '~', HOME unset")?;
            if stripped.is_empty() {
                return Ok(home);
            }
            let stripped = stripped.strip_prefix('/').unwrap_or(stripped);
            return Ok(home.join(stripped));
        }
    }
    Ok(path)
}

fn user_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    None
}
