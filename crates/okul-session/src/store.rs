//! Secure key-value storage port and host-side implementations.
//!
//! The platform keychain (iOS Keychain, Android Keystore) sits behind the
//! [`SecureStore`] trait; this crate never sees the encryption layer. Two
//! implementations ship here:
//! - [`MemoryStore`] - plain in-memory map, used in tests and as a stand-in
//!   on hosts without a keychain binding
//! - [`FileStore`] - single JSON file, for development builds on desktop

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use okul_core::prelude::*;

/// Durable key-value persistence for session fields.
///
/// Values are opaque strings; callers decide whether they hold raw text or
/// serialized JSON. Every method is a suspension point.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Read a value. Absent keys are `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory [`SecureStore`] backed by a `HashMap`.
///
/// The mutex is `std::sync` rather than `tokio::sync` because no lock is
/// held across an await point.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored keys, for test assertions.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("store mutex poisoned");
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().expect("store mutex poisoned");
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FileStore
// ─────────────────────────────────────────────────────────────────────────────

/// File-backed [`SecureStore`] holding all entries in one JSON object.
///
/// Not encrypted -- development hosts only. The file is rewritten whole on
/// every mutation; session payloads are a handful of short strings, so the
/// simplicity wins over an append log.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the backing file.
    entries: tokio::sync::Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or create) a store at `path`, loading any existing entries.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| Error::storage(format!("corrupt store file: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: tokio::sync::Mutex::new(entries),
        })
    }

    async fn flush(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, text).await?;
        Ok(())
    }
}

#[async_trait]
impl SecureStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_set_delete() {
        let store = MemoryStore::new();

        assert_eq!(store.get("accessToken").await.unwrap(), None);

        store.set("accessToken", "tok1").await.unwrap();
        assert_eq!(
            store.get("accessToken").await.unwrap(),
            Some("tok1".to_string())
        );

        store.delete("accessToken").await.unwrap();
        assert_eq!(store.get("accessToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_delete_absent_is_noop() {
        let store = MemoryStore::new();
        store.delete("nope").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_set_overwrites() {
        let store = MemoryStore::new();
        store.set("role", "teacher").await.unwrap();
        store.set("role", "parent").await.unwrap();
        assert_eq!(store.get("role").await.unwrap(), Some("parent".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let store = FileStore::open(&path).await.unwrap();
            store.set("accessToken", "tok1").await.unwrap();
            store.set("role", "parent").await.unwrap();
            store.delete("accessToken").await.unwrap();
        }

        // Reopen: only the surviving key should come back.
        let store = FileStore::open(&path).await.unwrap();
        assert_eq!(store.get("accessToken").await.unwrap(), None);
        assert_eq!(store.get("role").await.unwrap(), Some("parent".to_string()));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("absent.json")).await.unwrap();
        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, "not json at all").await.unwrap();

        let err = FileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }
}
