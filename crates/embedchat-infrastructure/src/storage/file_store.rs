//! File-backed durable store for visitor identities.

use super::atomic_json::{AtomicJsonError, AtomicJsonFile};
use crate::paths::EmbedchatPaths;
use chrono::{DateTime, Utc};
use embedchat_core::error::{EmbedchatError, Result};
use embedchat_core::identity::DurableStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    entries: BTreeMap<String, StoredValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    created_at: DateTime<Utc>,
}

/// A [`DurableStore`] persisted as a JSON file.
///
/// `put_if_absent` re-reads the file under an exclusive lock, so widget
/// instances in other threads or processes sharing the file always agree on
/// the first value written.
pub struct FileStore {
    file: AtomicJsonFile<StoreFile>,
}

impl FileStore {
    /// Opens the store at the default location (`<data_dir>/embedchat/identity.json`).
    pub fn new() -> Result<Self> {
        let path = EmbedchatPaths::identity_file()
            .map_err(|e| EmbedchatError::storage(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Opens the store at a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// When the value under `key` was first written.
    pub fn created_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let data = self.file.load().map_err(to_storage_error)?;
        Ok(data.and_then(|d| d.entries.get(key).map(|v| v.created_at)))
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let data = self.file.load().map_err(to_storage_error)?;
        Ok(data.and_then(|mut d| d.entries.remove(key).map(|v| v.value)))
    }

    fn put_if_absent(&self, key: &str, value: &str) -> Result<String> {
        self.file
            .update(StoreFile::default(), |data| {
                if let Some(existing) = data.entries.get(key) {
                    return (false, existing.value.clone());
                }
                data.entries.insert(
                    key.to_string(),
                    StoredValue {
                        value: value.to_string(),
                        created_at: Utc::now(),
                    },
                );
                (true, value.to_string())
            })
            .map_err(to_storage_error)
    }
}

fn to_storage_error(err: AtomicJsonError) -> EmbedchatError {
    match err {
        AtomicJsonError::IoError(e) => e.into(),
        AtomicJsonError::JsonError(e) => e.into(),
        AtomicJsonError::LockError(msg) => EmbedchatError::storage(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_path(temp_dir.path().join("identity.json"));
        assert_eq!(store.get("session_id@https://a.example").unwrap(), None);
    }

    #[test]
    fn test_put_if_absent_keeps_first_value() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::with_path(temp_dir.path().join("identity.json"));

        assert_eq!(store.put_if_absent("k", "first").unwrap(), "first");
        assert_eq!(store.put_if_absent("k", "second").unwrap(), "first");
        assert_eq!(store.get("k").unwrap(), Some("first".to_string()));
        assert!(store.created_at("k").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("identity.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::with_path(path);
        let err = store.get("k").unwrap_err();
        assert!(matches!(err, EmbedchatError::Serialization { .. }));
    }
}
