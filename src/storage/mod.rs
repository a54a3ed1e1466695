//! Namespaced persistence of store state.
//!
//! Two backends play the roles of a browser's `localStorage` and
//! `sessionStorage`:
//!
//! - **durable**: survives restarts, typically a [`FileStorage`]
//! - **session**: scoped to the running process, typically a [`MemoryStorage`]
//!
//! A [`Storage`] bundles one of each. [`PersistenceOptions`] pick the backend and
//! the key a value lives under, always as `{namespace_prefix}/{local_key}`.
//! Persistence is best-effort: every failure is logged and swallowed.

mod adapter;
mod area;
mod file;
mod options;

pub use adapter::Storage;
pub use area::{MemoryStorage, StorageArea};
pub use file::FileStorage;
pub use options::{derive_child_options, Backend, PersistenceOptions};
