//! Named collections of stores.
//!
//! A [`StoreComposer`] owns one [`Store`](crate::Store) per key. When it is
//! persisted, the set of child keys is itself kept in a store, so children
//! created at runtime are recreated on the next start.

mod composer;

pub use composer::{AuditEntry, AuditKind, StoreComposer};
