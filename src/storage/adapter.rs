use super::options::namespaced;
use super::{Backend, MemoryStorage, PersistenceOptions, StorageArea};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A durable and a session [`StorageArea`], shared by every store that
/// persists through them.
///
/// Cloning is cheap; clones use the same backends. None of the operations
/// fail: write errors are logged and unreadable entries read as absent.
#[derive(Clone)]
pub struct Storage {
    durable: Arc<dyn StorageArea>,
    session: Arc<dyn StorageArea>,
}

impl Storage {
    pub fn new(durable: Arc<dyn StorageArea>, session: Arc<dyn StorageArea>) -> Self {
        Self { durable, session }
    }

    /// Both backends in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    pub fn durable(&self) -> &Arc<dyn StorageArea> {
        &self.durable
    }

    pub fn session(&self) -> &Arc<dyn StorageArea> {
        &self.session
    }

    fn area(&self, backend: Backend) -> &dyn StorageArea {
        match backend {
            Backend::Durable => self.durable.as_ref(),
            Backend::Session => self.session.as_ref(),
        }
    }

    fn resolve(&self, options: &PersistenceOptions) -> Option<(&dyn StorageArea, String)> {
        let key = options.storage_key()?;
        let (backend, _) = options.target()?;
        Some((self.area(backend), key))
    }

    /// Serialize `value` as JSON and write it under the options' key.
    pub fn save<T: Serialize + ?Sized>(&self, value: &T, options: &PersistenceOptions) {
        let Some((area, key)) = self.resolve(options) else {
            return;
        };

        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(err) => {
                error!(%key, error = %err, "failed to serialize state for storage");
                return;
            }
        };

        if let Err(err) = area.set_item(&key, &text) {
            error!(%key, error = %err, "failed to write state to storage");
        }
    }

    /// Delete the entry under the options' key.
    pub fn remove(&self, options: &PersistenceOptions) {
        let Some((area, key)) = self.resolve(options) else {
            return;
        };

        if let Err(err) = area.remove_item(&key) {
            error!(%key, error = %err, "failed to remove state from storage");
        }
    }

    /// The stored value, if one exists and parses as `T`.
    pub fn load<T: DeserializeOwned>(&self, options: &PersistenceOptions) -> Option<T> {
        let (area, key) = self.resolve(options)?;

        let text = match area.get_item(&key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                warn!(%key, error = %err, "failed to read state from storage");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => {
                debug!(%key, "hydrated state from storage");
                Some(value)
            }
            Err(err) => {
                warn!(%key, error = %err, "ignoring unreadable stored state");
                None
            }
        }
    }

    /// The stored value, or `default` when there is none or it is unreadable.
    pub fn load_or_default<T: DeserializeOwned>(
        &self,
        default: T,
        options: Option<&PersistenceOptions>,
    ) -> T {
        options
            .and_then(|options| self.load(options))
            .unwrap_or(default)
    }

    /// `default_keys` followed by the child keys found in storage under the
    /// options' key, without duplicates.
    ///
    /// A child key is the segment directly below `{prefix}/{local_key}/`;
    /// deeper descendants are not reported.
    pub fn list_known_keys<I, S>(&self, default_keys: I, options: &PersistenceOptions) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = Vec::new();
        for key in default_keys {
            let key = key.into();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        let Some((area, base)) = self.resolve(options) else {
            return keys;
        };

        let stored = match area.keys() {
            Ok(stored) => stored,
            Err(err) => {
                warn!(key = %base, error = %err, "failed to scan storage for child keys");
                return keys;
            }
        };

        let prefix = namespaced(&base, "");
        for stored_key in stored {
            let Some(child) = stored_key.strip_prefix(&prefix) else {
                continue;
            };
            if child.is_empty() || child.contains('/') {
                continue;
            }
            if !keys.iter().any(|key| key == child) {
                keys.push(child.to_string());
            }
        }

        keys
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}
