//! In-memory key/value store with its own dispatch namespace.
//!
//! A [`Store`] backs both the host's built-in `set`/`get`/`has`/`del` keys and
//! the optional `store` capability, which gets an independent dispatcher via
//! [`bind_store`](crate::bind_store).

use crate::{dispatcher::Dispatcher, notify::Notifier};
use confmap_core::{
    BoxError, Input, MethodProvider, Notification, ValueError, as_object, key_list,
};
use serde_json::Value;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::broadcast;

/// Method names a store answers to.
pub const STORE_METHODS: [&str; 4] = ["set", "get", "has", "del"];

/// Errors raised by store operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// The value has the wrong shape for the operation.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// A `del` directive object without `force: true`.
    #[error("unsupported delete directive: expected `{{\"force\": true}}`, got {found}")]
    InvalidDirective {
        /// The directive as received.
        found: String,
    },
}

/// A named, insertion-ordered key/value store.
///
/// Every mutating or querying operation announces itself on the store's
/// [`Notifier`]; [`Store::value`] and [`Store::contains`] read silently.
pub struct Store {
    name: String,
    entries: RwLock<Input>,
    notifier: Notifier,
    pub(crate) config: OnceLock<Arc<Dispatcher>>,
}

impl Store {
    /// Create an empty store publishing on `notifier`.
    pub fn new(name: impl Into<String>, notifier: Notifier) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(Input::new()),
            notifier,
            config: OnceLock::new(),
        }
    }

    /// Name of the store.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The notifier this store publishes on.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Subscribe to this store's notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// The store's dispatcher, once bound.
    pub fn config(&self) -> Option<Arc<Dispatcher>> {
        self.config.get().cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, Input> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Input> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Single-key operations
    // ------------------------------------------------------------------

    /// Store `value` under `key`. Emits `set(key, value)`.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.write().insert(key.clone(), value.clone());
        self.notifier
            .emit(Notification::new("set", [Value::String(key), value]));
    }

    /// Read `key`. Emits `get(key, value)`, with `null` for a missing key.
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self.value(key);
        self.notifier.emit(Notification::new(
            "get",
            [Value::from(key), value.clone().unwrap_or(Value::Null)],
        ));
        value
    }

    /// Check `key`. Emits `has(key, bool)`.
    pub fn has(&self, key: &str) -> bool {
        let found = self.contains(key);
        self.notifier
            .emit(Notification::new("has", [Value::from(key), Value::Bool(found)]));
        found
    }

    /// Delete `key`, returning its previous value. Emits `del(key)`.
    pub fn del(&self, key: &str) -> Option<Value> {
        let removed = self.write().shift_remove(key);
        self.notifier.emit(Notification::new("del", [Value::from(key)]));
        removed
    }

    /// Delete every entry. Emits `del(key)` once per key that existed.
    pub fn clear(&self) -> Vec<String> {
        let drained = std::mem::take(&mut *self.write());
        let removed: Vec<String> = drained.into_iter().map(|(key, _)| key).collect();
        for key in &removed {
            self.notifier.emit(Notification::new("del", [Value::from(key.as_str())]));
        }
        removed
    }

    /// Read `key` without notifying.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    /// Check `key` without notifying.
    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// A copy of every entry.
    pub fn entries(&self) -> Input {
        self.read().clone()
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // ------------------------------------------------------------------
    // Dispatched forms
    // ------------------------------------------------------------------

    /// `set` with an object value: every entry is stored in order.
    pub fn apply_set(&self, value: &Value) -> Result<(), StoreError> {
        for (key, value) in as_object(value)? {
            self.set(key.as_str(), value.clone());
        }
        Ok(())
    }

    /// `get` with a key list.
    pub fn apply_get(&self, value: &Value) -> Result<(), StoreError> {
        for key in key_list(value)? {
            self.get(&key);
        }
        Ok(())
    }

    /// `has` with a key list.
    pub fn apply_has(&self, value: &Value) -> Result<(), StoreError> {
        for key in key_list(value)? {
            self.has(&key);
        }
        Ok(())
    }

    /// `del` with a key list, or `{"force": true}` to clear the store.
    pub fn apply_del(&self, value: &Value) -> Result<(), StoreError> {
        if let Value::Object(directive) = value {
            return match directive.get("force") {
                Some(Value::Bool(true)) => {
                    let _removed = self.clear();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(store = %self.name, count = _removed.len(), "store cleared");
                    Ok(())
                }
                _ => Err(StoreError::InvalidDirective {
                    found: value.to_string(),
                }),
            };
        }
        for key in key_list(value)? {
            self.del(&key);
        }
        Ok(())
    }

    fn apply(&self, name: &str, value: &Value) -> Option<Result<(), StoreError>> {
        let result = match name {
            "set" => self.apply_set(value),
            "get" => self.apply_get(value),
            "has" => self.apply_has(value),
            "del" => self.apply_del(value),
            _ => return None,
        };
        Some(result)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl MethodProvider for Store {
    fn has_method(&self, name: &str) -> bool {
        STORE_METHODS.contains(&name)
    }

    async fn call_method(&self, name: &str, value: Value) -> Option<Result<(), BoxError>> {
        self.apply(name, &value)
            .map(|result| result.map_err(BoxError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::drain;
    use serde_json::json;

    fn store() -> Store {
        Store::new("store", Notifier::new(64))
    }

    #[test]
    fn test_set_get_has_del() {
        let store = store();
        let mut rx = store.subscribe();

        store.set("a", json!(1));
        assert_eq!(store.get("a"), Some(json!(1)));
        assert!(store.has("a"));
        assert_eq!(store.del("a"), Some(json!(1)));
        assert!(!store.has("a"));

        let events: Vec<_> = drain(&mut rx).into_iter().map(|n| n.event).collect();
        assert_eq!(events, ["set", "get", "has", "del", "has"]);
    }

    #[test]
    fn test_apply_get_emits_per_key_in_order() {
        let store = store();
        store.set("b", json!("x"));
        let mut rx = store.subscribe();

        store.apply_get(&json!("a, b ,c")).unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![
                Notification::new("get", [json!("a"), Value::Null]),
                Notification::new("get", [json!("b"), json!("x")]),
                Notification::new("get", [json!("c"), Value::Null]),
            ]
        );
    }

    #[test]
    fn test_force_delete_clears_and_notifies_existing_keys() {
        let store = store();
        store.apply_set(&json!({ "a": 1, "b": 2, "c": 3 })).unwrap();
        let mut rx = store.subscribe();

        store.apply_del(&json!({ "force": true })).unwrap();

        assert!(store.is_empty());
        let deleted: Vec<_> = drain(&mut rx).into_iter().map(|n| n.args[0].clone()).collect();
        assert_eq!(deleted, [json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let store = store();
        assert!(matches!(store.apply_set(&json!("a")), Err(StoreError::Value(_))));
        assert!(matches!(
            store.apply_del(&json!({ "force": false })),
            Err(StoreError::InvalidDirective { .. })
        ));
        assert!(matches!(store.apply_has(&json!({ "a": 1 })), Err(StoreError::Value(_))));
    }

    #[tokio::test]
    async fn test_provider_answers_store_methods_only() {
        let store = store();
        assert!(store.has_method("del"));
        assert!(!store.has_method("option"));

        assert!(matches!(store.call_method("set", json!({ "k": "v" })).await, Some(Ok(()))));
        assert!(store.call_method("option", json!({})).await.is_none());
        assert_eq!(store.value("k"), Some(json!("v")));
    }
}
