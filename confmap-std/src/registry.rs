//! Action registry: what a key dispatches to.

use crate::dispatcher::Dispatcher;
use confmap_core::{DynHandler, Handler};
use std::{collections::HashMap, fmt, sync::Arc};

/// The resolved behavior for a key.
#[derive(Clone)]
pub enum Action {
    /// A method looked up by name on the dispatcher's target at dispatch time.
    Method(String),
    /// An explicitly supplied handler, called with `(key, value)`.
    Handler(Arc<dyn DynHandler>),
    /// A namespaced dispatcher that receives the (object) value as its input.
    Nested(Arc<Dispatcher>),
}

impl Action {
    /// Create a method action.
    pub fn method(name: impl Into<String>) -> Self {
        Action::Method(name.into())
    }

    /// Create a handler action.
    pub fn handler<H: Handler>(handler: H) -> Self {
        Action::Handler(Arc::new(handler))
    }

    /// Create a nested action.
    pub fn nested(dispatcher: Arc<Dispatcher>) -> Self {
        Action::Nested(dispatcher)
    }

    /// The method name, if this is a method action.
    pub fn method_name(&self) -> Option<&str> {
        match self {
            Action::Method(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Action::Handler(_) => f.write_str("Handler(..)"),
            Action::Nested(dispatcher) => f
                .debug_tuple("Nested")
                .field(&dispatcher.namespace())
                .finish(),
        }
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Action::method(name)
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Action::Method(name)
    }
}

impl From<Arc<Dispatcher>> for Action {
    fn from(dispatcher: Arc<Dispatcher>) -> Self {
        Action::Nested(dispatcher)
    }
}

/// A mapping from key to [`Action`].
///
/// Keys without an entry fall back to the method named after the key; that
/// policy lives in the dispatcher, not here.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action for `key`, replacing any previous one.
    pub fn map(&mut self, key: impl Into<String>, action: impl Into<Action>) -> &mut Self {
        self.actions.insert(key.into(), action.into());
        self
    }

    /// Register many actions at once.
    pub fn map_all<K, A, I>(&mut self, entries: I) -> &mut Self
    where
        K: Into<String>,
        A: Into<Action>,
        I: IntoIterator<Item = (K, A)>,
    {
        for (key, action) in entries {
            self.map(key, action);
        }
        self
    }

    /// Remove the action for `key`.
    pub fn unmap(&mut self, key: &str) -> Option<Action> {
        self.actions.remove(key)
    }

    /// Look up the action registered for `key`.
    pub fn get(&self, key: &str) -> Option<&Action> {
        self.actions.get(key)
    }

    /// Check if an action is registered for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.actions.contains_key(key)
    }

    /// Iterate over registered keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Get the number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confmap_core::BoxError;
    use serde_json::Value;

    #[test]
    fn test_map_and_lookup() {
        let mut registry = ActionRegistry::new();
        registry.map("set", "set").map("verbose", "option");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("verbose").and_then(Action::method_name), Some("option"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_map_all_and_replace() {
        let mut registry = ActionRegistry::new();
        registry.map_all([("a", "x"), ("b", "y")]);
        registry.map("a", Action::handler(|_key: String, _value: Value| async {
            Ok::<(), BoxError>(())
        }));

        assert!(matches!(registry.get("a"), Some(Action::Handler(_))));
        assert_eq!(registry.get("b").and_then(Action::method_name), Some("y"));

        let mut keys: Vec<_> = registry.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, ["a", "b"]);

        assert!(registry.unmap("a").is_some());
        assert!(!registry.contains("a"));
    }
}
