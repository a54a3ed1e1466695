//! Error types for stores, composers and storage backends.

use thiserror::Error;

/// Errors surfaced by [`Store`](crate::Store), [`StoreComposer`](crate::StoreComposer)
/// and the update strategies.
///
/// Persistence problems never show up here: they are logged and the store keeps
/// working in memory.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The initial (or rehydrated) state is not an object-like container.
    #[error("state provided to the store is not an object-like container (found {found})")]
    InvalidState { found: &'static str },

    /// A composer registry entry is not an object-like container.
    #[error("composer entry `{key}` is not an object-like container (found {found})")]
    InvalidRegistryEntry { key: String, found: &'static str },

    /// `get_store` on a key that was never created.
    #[error("the store with key `{0}` does not exist")]
    NotFound(String),

    /// A partial update that is not a JSON object.
    #[error("partial update must be an object (found {found})")]
    InvalidPartial { found: &'static str },

    /// `dispatch` on an action name with no registered reducer.
    #[error("no action registered under `{0}`")]
    UnknownAction(String),

    /// State or payload could not be converted to JSON.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    /// A merged value no longer fits the store's state type.
    #[error("merged state does not match the store's state type: {0}")]
    Decode(#[source] serde_json::Error),
}

impl StoreError {
    /// Whether this is a construction-time configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidState { .. } | StoreError::InvalidRegistryEntry { .. }
        )
    }
}

/// Errors raised by a [`StorageArea`](crate::storage::StorageArea) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Result alias used across the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
