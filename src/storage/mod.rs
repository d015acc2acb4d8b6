//! Local key-value persistence
//!
//! The device keeps a flat string-keyed store. [`KeyValueStore`] abstracts the
//! backend (an embedded `sled` database on disk, or memory for tests and
//! ephemeral runs) and [`LocalRepository`] layers typed, per-account access on
//! top of it so key naming and JSON encoding live in one place.
//!
//! Writes are independent read-modify-write sequences with last-write-wins
//! semantics; there is no compare-and-swap.

use crate::error::{MedlifeError, Result};
use sled::Db;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

pub mod repository;
pub mod types;

pub use repository::{AccountRepository, LocalRepository};
pub use types::{LoginMarkers, StorageKey};

/// A durable string map
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every value
    fn clear(&self) -> Result<()>;
}

/// Store backed by an embedded `sled` database
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create a store at `path`
    ///
    /// # Errors
    ///
    /// Returns `MedlifeError::Storage` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use medlife::storage::{KeyValueStore, SledStore};
    ///
    /// # fn main() -> medlife::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let store = SledStore::open(dir.path().join("store"))?;
    /// store.set("userEmail", "jane@example.com")?;
    /// assert_eq!(store.get("userEmail")?.as_deref(), Some("jane@example.com"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MedlifeError::Storage(format!("Failed to create storage directory: {}", e))
            })?;
        }
        let db = sled::open(path)
            .map_err(|e| MedlifeError::Storage(format!("Failed to open database: {}", e)))?;
        tracing::debug!("Opened local store at {}", path.display());
        Ok(Self { db })
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| MedlifeError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| MedlifeError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let value = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    MedlifeError::Storage(format!("Value for {} is not UTF-8: {}", key, e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| MedlifeError::Storage(format!("Insert failed: {}", e)))?;
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| MedlifeError::Storage(format!("Remove failed: {}", e)))?;
        self.flush()
    }

    fn clear(&self) -> Result<()> {
        self.db
            .clear()
            .map_err(|e| MedlifeError::Storage(format!("Clear failed: {}", e)))?;
        self.flush()
    }
}

/// Process-local store
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> MedlifeError {
    MedlifeError::Storage("Memory store lock poisoned".to_string())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.clear();
        Ok(())
    }
}
