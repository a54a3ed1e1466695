use super::shape::{is_object_like, shape_of, to_object};
use super::Subscriber;
use crate::abort::AbortSignal;
use crate::error::{Result, StoreError};
use crate::storage::{PersistenceOptions, Storage};
use crate::sync;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

struct Snapshots<T> {
    current: T,
    previous: T,
    changed_at: u64,
}

struct Persistence {
    storage: Storage,
    options: PersistenceOptions,
}

/// An observable container for one object-like state value.
///
/// The store keeps the current state and the state it replaced. Every update
/// moves `current` into `previous`, writes the new state through to storage
/// (when persistence is configured) and then calls each subscriber, in
/// registration order, with `(current, previous)`.
///
/// Accessors return owned copies, so nothing handed out by the store can be
/// used to change its state outside the update methods.
///
/// Cloning a `Store` yields another handle to the same state.
///
/// # Examples
///
/// ```
/// use wc_store::{AbortController, Store, Subscriber};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Counter { count: u32 }
///
/// let store = Store::new(Counter { count: 0 }).unwrap();
/// let controller = AbortController::new();
///
/// store.subscribe(
///     &controller.signal(),
///     Subscriber::new(|current: &Counter, previous: &Counter| {
///         assert_eq!(current.count, previous.count + 1);
///     }),
/// );
///
/// store.update(|state| state.count += 1);
/// assert_eq!(store.get_current(), Counter { count: 1 });
/// assert_eq!(store.get_previous(), Counter { count: 0 });
/// ```
pub struct Store<T> {
    state: Arc<RwLock<Snapshots<T>>>,
    subscribers: Arc<RwLock<Vec<Subscriber<T>>>>,
    persistence: Arc<RwLock<Option<Persistence>>>,
    initial: Arc<T>,
}

impl<T> Store<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create an in-memory store.
    ///
    /// Fails with [`StoreError::InvalidState`] unless `initial` is object-like.
    pub fn new(initial: T) -> Result<Self> {
        Self::build(initial, None)
    }

    /// Create a store persisted through `storage`.
    ///
    /// A readable value already stored under the options' key takes precedence
    /// over `initial`. The resulting state is written back immediately. Options
    /// without a namespace prefix disable persistence entirely.
    pub fn with_storage(initial: T, storage: Storage, options: PersistenceOptions) -> Result<Self> {
        Self::build(initial, Some(Persistence { storage, options }))
    }

    fn build(initial: T, persistence: Option<Persistence>) -> Result<Self> {
        let persistence = persistence.filter(|p| p.options.is_enabled());

        let state = match &persistence {
            Some(p) => match p.storage.load::<T>(&p.options) {
                Some(stored) if is_object_like(&stored) => stored,
                Some(stored) => {
                    let found = serde_json::to_value(&stored)
                        .map(|value| shape_of(&value))
                        .unwrap_or("unencodable value");
                    let key = p.options.storage_key().unwrap_or_default();
                    warn!(%key, found, "stored state is not object-like, using the initial state");
                    initial
                }
                None => initial,
            },
            None => initial,
        };

        to_object(&state)?;

        if let Some(p) = &persistence {
            p.storage.save(&state, &p.options);
        }

        Ok(Self {
            initial: Arc::new(state.clone()),
            state: Arc::new(RwLock::new(Snapshots {
                previous: state.clone(),
                current: state,
                changed_at: now_millis(),
            })),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            persistence: Arc::new(RwLock::new(persistence)),
        })
    }

    /// A copy of the current state.
    pub fn get_current(&self) -> T {
        sync::read(&self.state).current.clone()
    }

    /// A copy of the state replaced by the last update.
    ///
    /// Equal to the current state until the first update.
    pub fn get_previous(&self) -> T {
        sync::read(&self.state).previous.clone()
    }

    /// Copies of `(current, previous)` taken together.
    pub fn snapshots(&self) -> (T, T) {
        let state = sync::read(&self.state);
        (state.current.clone(), state.previous.clone())
    }

    /// Milliseconds since the Unix epoch at the last change. Never decreases.
    pub fn change_timestamp(&self) -> u64 {
        sync::read(&self.state).changed_at
    }

    /// Read the current state without copying it.
    ///
    /// `f` runs under the store's read lock and must not update this store.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = sync::read(&self.state);
        f(&state.current)
    }

    /// The state the store started from, after hydration.
    pub fn initial_state(&self) -> T {
        (*self.initial).clone()
    }

    /// Top-level field `key` of the current state.
    pub fn select(&self, key: &str) -> Option<Value> {
        self.read(|current| select_field(current, key))
    }

    /// Top-level field `key` of the previous state.
    pub fn select_previous(&self, key: &str) -> Option<Value> {
        let state = sync::read(&self.state);
        select_field(&state.previous, key)
    }

    /// Replace the state wholesale.
    ///
    /// Subscriber panics are not caught: they unwind out of `set_state` after
    /// the new state has been stored and persisted.
    pub fn set_state(&self, new_state: T) {
        match self.commit(|_| Ok::<_, Infallible>(new_state)) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Edit the current state in place, then notify as with
    /// [`set_state`](Store::set_state).
    ///
    /// `f` runs under the store's write lock and must not touch this store.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let result = self.commit(|current| {
            let mut next = current.clone();
            f(&mut next);
            Ok::<_, Infallible>(next)
        });
        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Shallow-merge `partial` into the current state.
    ///
    /// Each top-level key of `partial` replaces the same key of the current
    /// state; nested values are not merged. Fails, leaving the store untouched,
    /// when `partial` is not an object or the merged value no longer fits `T`.
    pub fn merge<P>(&self, partial: &P) -> Result<()>
    where
        P: Serialize + ?Sized,
    {
        let partial = match serde_json::to_value(partial).map_err(StoreError::Encode)? {
            Value::Object(partial) => partial,
            other => {
                return Err(StoreError::InvalidPartial {
                    found: shape_of(&other),
                })
            }
        };

        self.commit(|current| {
            let mut merged = to_object(current)?;
            merged.extend(partial);
            serde_json::from_value(Value::Object(merged)).map_err(StoreError::Decode)
        })
    }

    /// Compute, store and persist the next state under one write lock, then
    /// notify subscribers with the lock released.
    fn commit<F, E>(&self, next: F) -> std::result::Result<(), E>
    where
        F: FnOnce(&T) -> std::result::Result<T, E>,
    {
        {
            let mut state = sync::write(&self.state);
            let new_state = next(&state.current)?;
            state.previous = std::mem::replace(&mut state.current, new_state);
            state.changed_at = now_millis().max(state.changed_at);
            self.persist(&state.current);
        }

        self.notify();
        Ok(())
    }

    /// Register `subscriber` until `signal` fires.
    ///
    /// Registering a subscriber that is already registered is a no-op, as is
    /// subscribing with a signal that has already fired.
    pub fn subscribe(&self, signal: &AbortSignal, subscriber: Subscriber<T>) {
        if signal.is_aborted() {
            debug!("ignoring subscription on an aborted signal");
            return;
        }

        {
            let mut subscribers = sync::write(&self.subscribers);
            if subscribers.iter().any(|s| s.same_as(&subscriber)) {
                return;
            }
            subscribers.push(subscriber.clone());
        }

        let subscribers = Arc::downgrade(&self.subscribers);
        let store_alive = subscribers.clone();
        let registered = subscriber.clone();
        let listening = signal.on_abort_while(move || store_alive.strong_count() > 0, move || {
            if let Some(subscribers) = subscribers.upgrade() {
                sync::write(&subscribers).retain(|s| !s.same_as(&registered));
                debug!("subscription torn down");
            }
        });

        if listening {
            debug!("subscription registered");
        } else {
            sync::write(&self.subscribers).retain(|s| !s.same_as(&subscriber));
        }
    }

    /// Subscribe a closure and return its [`Subscriber`] handle.
    pub fn on_change<F>(&self, signal: &AbortSignal, callback: F) -> Subscriber<T>
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let subscriber = Subscriber::new(callback);
        self.subscribe(signal, subscriber.clone());
        subscriber
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        sync::read(&self.subscribers).len()
    }

    /// Options this store persists under, if it persists at all.
    pub fn persistence(&self) -> Option<PersistenceOptions> {
        sync::read(&self.persistence)
            .as_ref()
            .map(|p| p.options.clone())
    }

    /// Remove the persisted entry and stop writing through to storage.
    pub(crate) fn detach_persistence(&self) {
        if let Some(p) = sync::write(&self.persistence).take() {
            p.storage.remove(&p.options);
        }
    }

    fn persist(&self, state: &T) {
        if let Some(p) = sync::read(&self.persistence).as_ref() {
            p.storage.save(state, &p.options);
        }
    }

    fn notify(&self) {
        let subscribers = sync::read(&self.subscribers).clone();

        for subscriber in &subscribers {
            // An earlier subscriber may have torn this one down.
            let live = sync::read(&self.subscribers)
                .iter()
                .any(|s| s.same_as(subscriber));
            if !live {
                continue;
            }

            // Re-read per call: an earlier subscriber may have updated the store.
            let (current, previous) = self.snapshots();
            subscriber.call(&current, &previous);
        }
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscribers: Arc::clone(&self.subscribers),
            persistence: Arc::clone(&self.persistence),
            initial: Arc::clone(&self.initial),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = sync::read(&self.state);
        f.debug_struct("Store")
            .field("current", &state.current)
            .field("previous", &state.previous)
            .field("changed_at", &state.changed_at)
            .field("subscribers", &sync::read(&self.subscribers).len())
            .finish()
    }
}

fn select_field<T: Serialize>(state: &T, key: &str) -> Option<Value> {
    to_object(state).ok()?.remove(key)
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
