//! Persisted key-value preferences.
//!
//! A small schema-less string store backed by a JSON file, holding the
//! handful of values the auth core remembers across launches: the active
//! identity provider and the last unlock mode. The host application decides
//! where the file lives.
//!
//! Reads of a missing file behave as an empty store; writes create parent
//! directories as needed.

use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Preference key for the persisted identity provider.
pub const AUTH_PROVIDER_KEY: &str = "AuthProvider";

/// Preference key for the persisted vault unlock mode.
pub const LAST_UNLOCK_MODE_KEY: &str = "LastUnlockMode";

/// File-backed string key-value store.
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    /// Create a preferences store backed by the given file path.
    ///
    /// The file is not created until the first `set`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a preference value, or `None` if it has never been set.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    /// Set a preference value, creating the backing file if needed.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    /// Remove a preference value. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }

    async fn read_map(&self) -> Result<HashMap<String, String>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Preferences file not found, treating as empty");
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_vec_pretty(map)?;
        fs::write(&self.path, contents).await?;
        Ok(())
    }
}
