use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// Which backend of a [`Storage`](super::Storage) a value lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Durable,
    Session,
}

/// Where, if anywhere, a store persists its state.
///
/// Without a `namespace_prefix` nothing is persisted, whatever the other fields
/// say. When both keys are set the durable key wins.
///
/// # Examples
///
/// ```
/// use wc_store::PersistenceOptions;
///
/// let options = PersistenceOptions::new("todo-app").durable("lists");
/// assert_eq!(options.storage_key().as_deref(), Some("todo-app/lists"));
///
/// let parsed = PersistenceOptions::from_json(
///     r#"{ "namespacePrefix": "todo-app", "sessionKey": "draft" }"#,
/// ).unwrap();
/// assert_eq!(parsed.storage_key().as_deref(), Some("todo-app/draft"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistenceOptions {
    pub namespace_prefix: Option<String>,
    pub durable_key: Option<String>,
    pub session_key: Option<String>,
}

impl PersistenceOptions {
    /// Options under `namespace_prefix`, with no key chosen yet.
    pub fn new(namespace_prefix: impl Into<String>) -> Self {
        Self {
            namespace_prefix: Some(namespace_prefix.into()),
            ..Self::default()
        }
    }

    /// Persist into the durable backend under `key`.
    pub fn durable(mut self, key: impl Into<String>) -> Self {
        self.durable_key = Some(key.into());
        self
    }

    /// Persist into the session backend under `key`.
    pub fn session(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    /// Parse options from their JSON form.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(StoreError::Decode)
    }

    /// Whether these options persist anything at all.
    pub fn is_enabled(&self) -> bool {
        self.target().is_some()
    }

    /// The backend and local key that will be used.
    pub fn target(&self) -> Option<(Backend, &str)> {
        self.namespace_prefix.as_ref()?;
        if let Some(key) = &self.durable_key {
            Some((Backend::Durable, key))
        } else {
            self.session_key
                .as_deref()
                .map(|key| (Backend::Session, key))
        }
    }

    /// Full namespaced key, `{namespace_prefix}/{local_key}`.
    pub fn storage_key(&self) -> Option<String> {
        let prefix = self.namespace_prefix.as_deref()?;
        let (_, key) = self.target()?;
        Some(namespaced(prefix, key))
    }

    /// Options for a child named `child_key`. See [`derive_child_options`].
    pub fn child(&self, child_key: &str) -> Option<Self> {
        derive_child_options(child_key, Some(self))
    }
}

/// Build a child's options by nesting `child_key` under the parent's keys.
///
/// Returns `None` when the parent does not persist: children of an unpersisted
/// store are never persisted on their own.
pub fn derive_child_options(
    child_key: &str,
    parent: Option<&PersistenceOptions>,
) -> Option<PersistenceOptions> {
    let parent = parent?;
    let prefix = parent.namespace_prefix.clone()?;

    Some(PersistenceOptions {
        namespace_prefix: Some(prefix),
        durable_key: parent
            .durable_key
            .as_deref()
            .map(|key| namespaced(key, child_key)),
        session_key: parent
            .session_key
            .as_deref()
            .map(|key| namespaced(key, child_key)),
    })
}

pub(crate) fn namespaced(parent: &str, child: &str) -> String {
    format!("{parent}/{child}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_required() {
        let options = PersistenceOptions {
            namespace_prefix: None,
            durable_key: Some("k".into()),
            session_key: Some("s".into()),
        };
        assert!(!options.is_enabled());
        assert_eq!(options.storage_key(), None);
    }

    #[test]
    fn durable_key_wins() {
        let options = PersistenceOptions::new("p").session("s").durable("d");
        assert_eq!(options.target(), Some((Backend::Durable, "d")));
        assert_eq!(options.storage_key().as_deref(), Some("p/d"));
    }

    #[test]
    fn prefix_without_key_is_disabled() {
        assert!(!PersistenceOptions::new("p").is_enabled());
    }

    #[test]
    fn child_options_nest_both_keys() {
        let parent = PersistenceOptions::new("p").durable("d").session("s");
        let child = derive_child_options("todos", Some(&parent)).unwrap();

        assert_eq!(child.namespace_prefix.as_deref(), Some("p"));
        assert_eq!(child.durable_key.as_deref(), Some("d/todos"));
        assert_eq!(child.session_key.as_deref(), Some("s/todos"));
        assert_eq!(child.storage_key().as_deref(), Some("p/d/todos"));
    }

    #[test]
    fn unpersisted_parent_has_no_child_options() {
        assert_eq!(derive_child_options("x", None), None);
        let parent = PersistenceOptions {
            durable_key: Some("d".into()),
            ..Default::default()
        };
        assert_eq!(parent.child("x"), None);
    }

    #[test]
    fn json_form_is_camel_case() {
        let options = PersistenceOptions::from_json(r#"{"namespacePrefix":"p","durableKey":"d"}"#)
            .unwrap();
        assert_eq!(options, PersistenceOptions::new("p").durable("d"));
        assert!(PersistenceOptions::from_json("{}").unwrap() == PersistenceOptions::default());
    }
}
