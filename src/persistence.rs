//! Key/value persistence for the record snapshot.
//!
//! The store keeps the whole record set as one blob under one key, so the
//! backend only needs `get` and `set`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::{Result, TrackerError};

/// Scoped key/value storage holding serialized blobs
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the blob stored under `key`
    fn set(&self, key: &str, blob: &[u8]) -> Result<()>;

    /// Block until earlier writes are durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Embedded on-disk store backed by sled
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the store in `path`
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let db = sled::open(path)?;
        debug!(path = %path.display(), "Opened snapshot store");

        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|value| value.to_vec()))
    }

    fn set(&self, key: &str, blob: &[u8]) -> Result<()> {
        self.db.insert(key.as_bytes(), blob)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let bytes = self.db.flush()?;
        debug!(bytes, "Flushed snapshot store");
        Ok(())
    }
}

/// In-process store, used for tests and embedding
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one blob
    #[must_use]
    pub fn with_entry(key: &str, blob: &[u8]) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_vec());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| TrackerError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, blob: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| TrackerError::Storage(e.to_string()))?;
        entries.insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sled_store_overwrites_blob() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(&dir.path().join("snapshots")).unwrap();
        assert_eq!(store.get("@expenses").unwrap(), None);
        store.set("@expenses", b"[]").unwrap();
        store.set("@expenses", b"[1]").unwrap();
        assert_eq!(store.get("@expenses").unwrap(), Some(b"[1]".to_vec()));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn test_sled_store_flush_keeps_blob() {
        let dir = tempdir().unwrap();
        let store = SledStore::open(&dir.path().join("snapshots")).unwrap();
        store.set("@expenses", b"[2]").unwrap();
        store.flush().unwrap();
        assert_eq!(store.get("@expenses").unwrap(), Some(b"[2]".to_vec()));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_entry("k", b"v");
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get("missing").unwrap(), None);
        store.set("k", b"w").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"w".to_vec()));
    }
}
