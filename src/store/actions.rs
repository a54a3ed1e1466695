use super::Store;
use crate::error::{Result, StoreError};
use crate::sync;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type Reducer<T> = Arc<dyn Fn(&Value, &T, &T) -> Value + Send + Sync>;

/// Action-dispatch front end for a [`Store`].
///
/// Each action is a pure reducer computing a partial update from
/// `(payload, current, previous)`. Dispatching applies that partial with
/// [`Store::merge`], so subscribers see the same notifications as for any other
/// update.
///
/// # Examples
///
/// ```
/// use wc_store::{Actions, Store};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Counter { count: i64 }
///
/// let actions = Actions::new(Store::new(Counter { count: 0 }).unwrap())
///     .with("add", |payload, current: &Counter, _previous| {
///         json!({ "count": current.count + payload.as_i64().unwrap_or(0) })
///     });
///
/// actions.dispatch("add", 5).unwrap();
/// assert_eq!(actions.store().get_current(), Counter { count: 5 });
/// ```
pub struct Actions<T> {
    store: Store<T>,
    reducers: Arc<RwLock<HashMap<String, Reducer<T>>>>,
}

impl<T> Actions<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(store: Store<T>) -> Self {
        Self {
            store,
            reducers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Builder form of [`register`](Actions::register).
    pub fn with<F>(self, name: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(&Value, &T, &T) -> Value + Send + Sync + 'static,
    {
        self.register(name, reducer);
        self
    }

    /// Register `reducer` under `name`, replacing any previous one.
    pub fn register<F>(&self, name: impl Into<String>, reducer: F)
    where
        F: Fn(&Value, &T, &T) -> Value + Send + Sync + 'static,
    {
        sync::write(&self.reducers).insert(name.into(), Arc::new(reducer));
    }

    /// Run the reducer registered under `name` and merge its result.
    pub fn dispatch<P>(&self, name: &str, payload: P) -> Result<()>
    where
        P: Serialize,
    {
        let reducer = sync::read(&self.reducers)
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownAction(name.to_string()))?;

        let payload = serde_json::to_value(payload).map_err(StoreError::Encode)?;
        let (current, previous) = self.store.snapshots();
        let partial = reducer(&payload, &current, &previous);

        debug!(action = name, "dispatching action");
        self.store.merge(&partial)
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = sync::read(&self.reducers).keys().cloned().collect();
        names.sort();
        names
    }

    /// The store actions are applied to.
    pub fn store(&self) -> &Store<T> {
        &self.store
    }
}

impl<T> Clone for Actions<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            reducers: Arc::clone(&self.reducers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::AbortController;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Todos {
        items: Vec<String>,
        filter: String,
    }

    fn todo_actions() -> Actions<Todos> {
        let store = Store::new(Todos {
            items: vec![],
            filter: "all".into(),
        })
        .unwrap();

        Actions::new(store)
            .with("add", |payload, current: &Todos, _| {
                let mut items = current.items.clone();
                items.extend(payload.as_str().map(String::from));
                json!({ "items": items })
            })
            .with("undo", |_, _, previous: &Todos| json!({ "items": previous.items }))
    }

    #[test]
    fn dispatch_merges_reducer_output() {
        let actions = todo_actions();

        actions.dispatch("add", "write docs").unwrap();
        actions.dispatch("add", "ship").unwrap();

        let state = actions.store().get_current();
        assert_eq!(state.items, vec!["write docs", "ship"]);
        assert_eq!(state.filter, "all");
    }

    #[test]
    fn reducers_see_previous_state() {
        let actions = todo_actions();
        actions.dispatch("add", "a").unwrap();
        actions.dispatch("add", "b").unwrap();

        actions.dispatch("undo", ()).unwrap();
        assert_eq!(actions.store().get_current().items, vec!["a"]);
    }

    #[test]
    fn dispatch_notifies_subscribers() {
        let actions = todo_actions();
        let controller = AbortController::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        actions
            .store()
            .on_change(&controller.signal(), move |current: &Todos, _: &Todos| {
                seen_clone.lock().unwrap().push(current.items.len());
            });

        actions.dispatch("add", "x").unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn unknown_action_is_an_error() {
        let actions = todo_actions();
        let err = actions.dispatch("remove", 0).unwrap_err();
        assert!(matches!(err, StoreError::UnknownAction(name) if name == "remove"));
        assert_eq!(actions.names(), vec!["add", "undo"]);
    }
}
