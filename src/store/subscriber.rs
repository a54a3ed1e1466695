use std::fmt;
use std::sync::Arc;

/// A change listener called with `(current, previous)` after every update.
///
/// Subscribers are compared by identity: clones of one `Subscriber` are the
/// same subscriber, two `Subscriber::new` calls never are, even with identical
/// closures.
pub struct Subscriber<T> {
    callback: Arc<dyn Fn(&T, &T) + Send + Sync>,
}

impl<T> Subscriber<T> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Whether `self` and `other` are the same subscriber.
    pub fn same_as(&self, other: &Self) -> bool {
        // Compare data pointers only; vtable pointers are not unique.
        std::ptr::addr_eq(Arc::as_ptr(&self.callback), Arc::as_ptr(&other.callback))
    }

    pub(crate) fn call(&self, current: &T, previous: &T) {
        (self.callback)(current, previous)
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Subscriber")
            .field(&Arc::as_ptr(&self.callback))
            .finish()
    }
}
