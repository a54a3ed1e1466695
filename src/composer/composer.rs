use crate::abort::AbortSignal;
use crate::error::{Result, StoreError};
use crate::storage::{PersistenceOptions, Storage};
use crate::store::{is_object_like, now_millis, to_object, Store};
use crate::sync;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Persisted enumeration of a composer's children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComposerIndex {
    child_storage_keys: Vec<String>,
}

/// What happened to a child store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditKind {
    Created,
    Deleted,
}

/// One entry of a composer's audit log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub key: String,
    pub kind: AuditKind,
    /// Milliseconds since the Unix epoch.
    pub at: u64,
}

/// A registry of named [`Store`]s.
///
/// All children share the state type `T`; use the default
/// [`serde_json::Value`] for children of different shapes.
///
/// With persistence configured, each child is persisted under the composer's
/// key (`{prefix}/{composer_key}/{child_key}`) and the list of child keys is
/// kept in its own store at `{prefix}/{composer_key}`. A composer rebuilt from
/// the same storage recovers every child created since, even when the initial
/// registry passed in no longer names it.
///
/// # Examples
///
/// ```
/// use wc_store::{PersistenceOptions, Storage, StoreComposer};
/// use serde_json::json;
///
/// let storage = Storage::in_memory();
/// let options = PersistenceOptions::new("app").durable("stores");
///
/// let composer = StoreComposer::with_storage(
///     [("settings", json!({ "theme": "dark" }))],
///     storage.clone(),
///     options.clone(),
/// ).unwrap();
/// composer.create_store("cart", json!({ "items": [] })).unwrap();
///
/// let restored = StoreComposer::with_storage(
///     [("settings", json!({ "theme": "light" }))],
///     storage,
///     options,
/// ).unwrap();
/// assert_eq!(restored.keys(), vec!["settings", "cart"]);
/// assert_eq!(
///     restored.get_store("settings").unwrap().get_current(),
///     json!({ "theme": "dark" }),
/// );
/// ```
pub struct StoreComposer<T = Value> {
    stores: Arc<RwLock<Vec<(String, Store<T>)>>>,
    persistence: Option<(Storage, PersistenceOptions)>,
    index: Option<Store<ComposerIndex>>,
    history: Arc<RwLock<Vec<AuditEntry>>>,
}

impl<T> StoreComposer<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create an in-memory composer with one child per entry of `initial`.
    pub fn new<I, K>(initial: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        Self::build(collect_entries(initial)?, None)
    }

    /// Create a composer persisted through `storage`.
    pub fn with_storage<I, K>(
        initial: I,
        storage: Storage,
        options: PersistenceOptions,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        Self::build(collect_entries(initial)?, Some((storage, options)))
    }

    fn build(
        initial: Vec<(String, T)>,
        persistence: Option<(Storage, PersistenceOptions)>,
    ) -> Result<Self> {
        let persistence = persistence.filter(|(_, options)| options.is_enabled());
        let defaults: Vec<String> = initial.iter().map(|(key, _)| key.clone()).collect();

        let (keys, index) = match &persistence {
            None => (defaults, None),
            Some((storage, options)) => {
                let index = Store::with_storage(
                    ComposerIndex {
                        child_storage_keys: defaults.clone(),
                    },
                    storage.clone(),
                    options.clone(),
                )?;
                let persisted = index.get_current().child_storage_keys;
                let keys = storage.list_known_keys(defaults.into_iter().chain(persisted), options);
                (keys, Some(index))
            }
        };

        let mut initial = initial;
        let mut stores = Vec::with_capacity(keys.len());

        for key in keys {
            let pos = initial.iter().position(|(k, _)| *k == key);
            let default = pos.map(|pos| initial.swap_remove(pos).1);

            let store = match (&persistence, default) {
                (None, Some(value)) => Store::new(value)?,
                (Some((storage, options)), Some(value)) => {
                    Store::with_storage(value, storage.clone(), child_options(options, &key))?
                }
                (Some((storage, options)), None) => {
                    let child = child_options(options, &key);
                    let recovered = storage
                        .load::<T>(&child)
                        .filter(|value| is_object_like(value))
                        .or_else(|| {
                            warn!(%key, "no usable stored state for recovered child store, starting empty");
                            empty_state()
                        });
                    match recovered {
                        Some(value) => Store::with_storage(value, storage.clone(), child)?,
                        None => {
                            warn!(%key, "state type has no empty value, dropping recovered child store");
                            continue;
                        }
                    }
                }
                (None, None) => continue,
            };

            debug!(%key, "child store ready");
            stores.push((key, store));
        }

        if let Some(index) = &index {
            let live: Vec<String> = stores.iter().map(|(key, _)| key.clone()).collect();
            if index.read(|current| current.child_storage_keys != live) {
                index.set_state(ComposerIndex {
                    child_storage_keys: live,
                });
            }
        }

        Ok(Self {
            stores: Arc::new(RwLock::new(stores)),
            persistence,
            index,
            history: Arc::new(RwLock::new(Vec::new())),
        })
    }

    /// The store registered under `key`.
    pub fn get_store(&self, key: &str) -> Result<Store<T>> {
        self.find(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Create and register a child store.
    ///
    /// When `key` is already registered this logs a warning and returns the
    /// existing store; `initial` is discarded and nothing is overwritten.
    pub fn create_store(&self, key: impl Into<String>, initial: T) -> Result<Store<T>> {
        let key = key.into();

        let store = {
            let mut stores = sync::write(&self.stores);
            if let Some((_, existing)) = stores.iter().find(|(k, _)| *k == key) {
                warn!(%key, "store already exists, keeping the existing store");
                return Ok(existing.clone());
            }

            let store = match &self.persistence {
                Some((storage, options)) => {
                    Store::with_storage(initial, storage.clone(), child_options(options, &key))?
                }
                None => Store::new(initial)?,
            };
            stores.push((key.clone(), store.clone()));
            store
        };

        if let Some(index) = &self.index {
            index.update(|index| {
                if !index.child_storage_keys.contains(&key) {
                    index.child_storage_keys.push(key.clone());
                }
            });
        }

        self.record(key, AuditKind::Created);
        Ok(store)
    }

    /// Remove the store registered under `key`.
    ///
    /// The child's stored state is deleted and its key leaves the persisted
    /// child list, so it is not recovered on the next start. A handle to the
    /// returned store keeps working in memory but no longer persists.
    pub fn delete_store(&self, key: &str) -> Option<Store<T>> {
        let removed = {
            let mut stores = sync::write(&self.stores);
            let pos = stores.iter().position(|(k, _)| k == key)?;
            stores.remove(pos).1
        };

        removed.detach_persistence();

        if let Some(index) = &self.index {
            index.update(|index| index.child_storage_keys.retain(|k| k != key));
        }

        self.record(key.to_string(), AuditKind::Deleted);
        Some(removed)
    }

    /// Registered keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        sync::read(&self.stores)
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        sync::read(&self.stores).iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        sync::read(&self.stores).len()
    }

    pub fn is_empty(&self) -> bool {
        sync::read(&self.stores).is_empty()
    }

    /// Subscribe `handler` to the stores named in `keys`.
    ///
    /// The handler is called with `(key, current, previous)`. Keys with no
    /// registered store are skipped.
    pub fn subscribe_to<F, I, S>(&self, signal: &AbortSignal, handler: F, keys: I)
    where
        F: Fn(&str, &T, &T) + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected: Vec<(String, Store<T>)> = {
            let stores = sync::read(&self.stores);
            keys.into_iter()
                .filter_map(|key| {
                    let key = key.as_ref();
                    let found = stores.iter().find(|(k, _)| k == key).cloned();
                    if found.is_none() {
                        debug!(%key, "skipping subscription to unknown store");
                    }
                    found
                })
                .collect()
        };

        Self::subscribe_each(signal, Arc::new(handler), selected);
    }

    /// Subscribe `handler` to every store registered right now.
    pub fn subscribe_to_all<F>(&self, signal: &AbortSignal, handler: F)
    where
        F: Fn(&str, &T, &T) + Send + Sync + 'static,
    {
        let selected = sync::read(&self.stores).clone();
        Self::subscribe_each(signal, Arc::new(handler), selected);
    }

    fn subscribe_each<F>(signal: &AbortSignal, handler: Arc<F>, selected: Vec<(String, Store<T>)>)
    where
        F: Fn(&str, &T, &T) + Send + Sync + 'static,
    {
        for (key, store) in selected {
            let handler = Arc::clone(&handler);
            store.on_change(signal, move |current, previous| handler(&key, current, previous));
        }
    }

    /// Creations and deletions since this composer was built, oldest first.
    pub fn history(&self) -> Vec<AuditEntry> {
        sync::read(&self.history).clone()
    }

    /// Options the composer persists under, if it persists at all.
    pub fn persistence(&self) -> Option<PersistenceOptions> {
        self.persistence
            .as_ref()
            .map(|(_, options)| options.clone())
    }

    fn find(&self, key: &str) -> Option<Store<T>> {
        sync::read(&self.stores)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, store)| store.clone())
    }

    fn record(&self, key: String, kind: AuditKind) {
        sync::write(&self.history).push(AuditEntry {
            key,
            kind,
            at: now_millis(),
        });
    }
}

impl<T> Clone for StoreComposer<T> {
    fn clone(&self) -> Self {
        Self {
            stores: Arc::clone(&self.stores),
            persistence: self.persistence.clone(),
            index: self.index.clone(),
            history: Arc::clone(&self.history),
        }
    }
}

impl<T> fmt::Debug for StoreComposer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = sync::read(&self.stores)
            .iter()
            .map(|(key, _)| key.clone())
            .collect();
        f.debug_struct("StoreComposer")
            .field("keys", &keys)
            .field("persistence", &self.persistence.as_ref().map(|(_, o)| o))
            .finish()
    }
}

fn collect_entries<I, K, T>(initial: I) -> Result<Vec<(String, T)>>
where
    I: IntoIterator<Item = (K, T)>,
    K: Into<String>,
    T: Serialize,
{
    let mut entries: Vec<(String, T)> = Vec::new();

    for (key, value) in initial {
        let key = key.into();
        to_object(&value).map_err(|err| match err {
            StoreError::InvalidState { found } => StoreError::InvalidRegistryEntry {
                key: key.clone(),
                found,
            },
            other => other,
        })?;

        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    Ok(entries)
}

/// The empty object as `T`, when `T` can represent one.
fn empty_state<T: DeserializeOwned>() -> Option<T> {
    serde_json::from_value(Value::Object(serde_json::Map::new())).ok()
}

fn child_options(parent: &PersistenceOptions, key: &str) -> PersistenceOptions {
    parent.child(key).unwrap_or_default()
}
