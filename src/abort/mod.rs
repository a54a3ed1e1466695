//! Cancellation signals for subscriptions.
//!
//! Every subscription is tied to an [`AbortSignal`]. Firing the signal (through
//! its [`AbortController`] or a [`Lifecycle`]) tears down every subscription
//! registered against it, exactly once.

mod controller;
mod lifecycle;

pub use controller::{AbortController, AbortSignal};
pub use lifecycle::Lifecycle;
