use crate::sync;
use std::fmt;
use std::sync::{Arc, Mutex};

struct Listener {
    alive: Box<dyn Fn() -> bool + Send>,
    run: Box<dyn FnOnce() + Send>,
}

#[derive(Default)]
struct SignalState {
    aborted: bool,
    listeners: Vec<Listener>,
}

/// A shared, fire-once cancellation signal.
///
/// Clones observe the same underlying signal. Listeners registered with
/// [`on_abort`](AbortSignal::on_abort) run once, in registration order, when the
/// owning controller aborts.
#[derive(Clone, Default)]
pub struct AbortSignal {
    state: Arc<Mutex<SignalState>>,
}

impl AbortSignal {
    /// Whether the signal has already fired.
    pub fn is_aborted(&self) -> bool {
        sync::lock(&self.state).aborted
    }

    /// Register a teardown listener.
    ///
    /// Returns `false` (and drops `listener` without calling it) when the signal
    /// has already fired. The listener is held until the signal fires; use
    /// [`on_abort_while`](AbortSignal::on_abort_while) when it may become moot
    /// earlier.
    pub fn on_abort<F>(&self, listener: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_abort_while(|| true, listener)
    }

    /// Register a teardown listener that is discarded once `alive` returns
    /// `false`.
    ///
    /// Dead listeners are pruned whenever another listener is registered, so a
    /// long-lived signal shared by short-lived owners does not grow unbounded.
    pub fn on_abort_while<A, F>(&self, alive: A, listener: F) -> bool
    where
        A: Fn() -> bool + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let mut state = sync::lock(&self.state);
        if state.aborted {
            return false;
        }
        state.listeners.retain(|l| (l.alive)());
        state.listeners.push(Listener {
            alive: Box::new(alive),
            run: Box::new(listener),
        });
        true
    }

    /// Number of listeners waiting for the signal.
    pub fn listener_count(&self) -> usize {
        sync::lock(&self.state).listeners.len()
    }

    fn fire(&self) {
        let listeners = {
            let mut state = sync::lock(&self.state);
            if state.aborted {
                return;
            }
            state.aborted = true;
            std::mem::take(&mut state.listeners)
        };

        // Listeners may touch the signal again (e.g. `is_aborted`), so the lock
        // is released first.
        for listener in listeners {
            (listener.run)();
        }
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = sync::lock(&self.state);
        f.debug_struct("AbortSignal")
            .field("aborted", &state.aborted)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

/// Owner of an [`AbortSignal`].
///
/// # Examples
///
/// ```
/// use wc_store::AbortController;
///
/// let controller = AbortController::new();
/// let signal = controller.signal();
/// assert!(!signal.is_aborted());
///
/// controller.abort();
/// assert!(signal.is_aborted());
/// ```
#[derive(Clone, Debug, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    /// Create a controller with a fresh, unfired signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// The signal controlled by this controller.
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Fire the signal. Calling this more than once is a no-op.
    pub fn abort(&self) {
        self.signal.fire();
    }
}
