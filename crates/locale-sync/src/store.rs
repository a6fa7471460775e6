//! Loading and persisting localization trees on disk.

use std::{io, path::Path};

use anyhow::Result;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{
    error::CoreError,
    value::{JsonObject, ValueKind},
};

/// Reads and writes JSON trees as files.
///
/// Reads never fail: anything that prevents a usable object from being loaded
/// is logged and reported as `None`, which callers treat as an empty tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeStore;

impl TreeStore {
    pub fn new() -> Self {
        TreeStore
    }

    pub async fn read(&self, path: &Path) -> Option<JsonObject> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "tree file does not exist yet");
                return None;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read tree file");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Some(map),
            Ok(other) => {
                warn!(
                    path = %path.display(),
                    kind = ?ValueKind::of(&other),
                    "tree file root is not an object"
                );
                None
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to parse tree file");
                None
            }
        }
    }

    /// Write `tree` as 2-space indented JSON, creating parent directories.
    pub async fn write(&self, path: &Path, tree: &JsonObject) -> Result<()> {
        let rendered = serde_json::to_string_pretty(tree)
            .map_err(|source| CoreError::SerialiseTree { path: path.to_path_buf(), source })?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| CoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, rendered)
            .await
            .map_err(|source| CoreError::WriteTree { path: path.to_path_buf(), source })?;
        info!(path = %path.display(), keys = tree.len(), "tree written");
        Ok(())
    }
}
