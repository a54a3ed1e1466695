use super::{AbortController, AbortSignal};

/// Lifetime of a consuming component.
///
/// Hands out one [`AbortSignal`] for all of the component's subscriptions and
/// fires it when the component is disconnected, or when the `Lifecycle` is
/// dropped, whichever comes first.
///
/// # Examples
///
/// ```
/// use wc_store::{Lifecycle, Store, Subscriber};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Counter { count: u32 }
///
/// let store = Store::new(Counter { count: 0 }).unwrap();
/// let component = Lifecycle::new();
/// store.subscribe(&component.signal(), Subscriber::new(|_: &Counter, _: &Counter| {}));
/// assert_eq!(store.subscriber_count(), 1);
///
/// component.disconnect();
/// assert_eq!(store.subscriber_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct Lifecycle {
    controller: AbortController,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal tied to this component's disconnection.
    pub fn signal(&self) -> AbortSignal {
        self.controller.signal()
    }

    /// Whether [`disconnect`](Lifecycle::disconnect) already ran.
    pub fn is_disconnected(&self) -> bool {
        self.controller.signal().is_aborted()
    }

    /// Tear down every subscription registered against this component's signal.
    pub fn disconnect(&self) {
        self.controller.abort();
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.controller.abort();
    }
}
