use crate::error::StorageError;
use crate::sync;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// A string key/value storage backend.
pub trait StorageArea: Send + Sync {
    /// Value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently stored.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory [`StorageArea`].
///
/// Keys are kept sorted so scans are deterministic.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        sync::read(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        sync::read(&self.items).is_empty()
    }
}

impl StorageArea for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(sync::read(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sync::write(&self.items).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        sync::write(&self.items).remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(sync::read(&self.items).keys().cloned().collect())
    }
}
