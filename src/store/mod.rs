//! Observable state containers.
//!
//! A [`Store`] owns one object-like state value and the snapshot it replaced,
//! notifies [`Subscriber`]s synchronously on every change, and can write its
//! state through to [`Storage`](crate::Storage).
//!
//! Besides wholesale replacement, stores accept shallow-merge updates
//! ([`Store::merge`]) and named actions through the [`Actions`] plugin.

mod actions;
mod shape;
mod store;
mod subscriber;

pub use actions::Actions;
pub use store::Store;
pub use subscriber::Subscriber;

pub(crate) use shape::{is_object_like, to_object};
pub(crate) use store::now_millis;
