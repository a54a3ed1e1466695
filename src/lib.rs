//! # wc-store
//!
//! Observable state containers for component-based user interfaces, with
//! optional persistence into key/value storage.
//!
//! ## Store
//!
//! A [`Store`] holds one object-like state value:
//! - `get_current` / `get_previous` return independent copies of the current
//!   state and the state it replaced
//! - `set_state`, `update` and `merge` change the state and notify every
//!   [`Subscriber`] synchronously with `(current, previous)`
//! - subscriptions live until their [`AbortSignal`] fires
//! - [`Actions`] adds named, reducer-style updates on top of a store
//!
//! ## StoreComposer
//!
//! A [`StoreComposer`] is a registry of named stores. When persisted, it also
//! remembers which children exist, so stores created at runtime come back on
//! the next start.
//!
//! ## Persistence
//!
//! [`Storage`] pairs a durable and a session [`StorageArea`].
//! [`PersistenceOptions`] opt a store in: nothing is written unless a namespace
//! prefix is set. Storage failures never break a store; they are logged through
//! `tracing` and the store carries on in memory.

pub mod abort;
pub mod composer;
pub mod error;
pub mod storage;
pub mod store;

mod sync;

// Re-export main types for convenience
pub use abort::{AbortController, AbortSignal, Lifecycle};
pub use composer::{AuditEntry, AuditKind, StoreComposer};
pub use error::{Result, StorageError, StoreError};
pub use storage::{
    derive_child_options, Backend, FileStorage, MemoryStorage, PersistenceOptions, Storage,
    StorageArea,
};
pub use store::{Actions, Store, Subscriber};
