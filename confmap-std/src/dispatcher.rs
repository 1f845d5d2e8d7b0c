//! # Dispatcher
//!
//! A [`Dispatcher`] owns one dispatch declaration (an [`AliasTable`], an
//! [`ActionRegistry`] and a list of priority keys) and a non-owning reference
//! to the target whose methods back [`Action::Method`] entries.
//!
//! # Processing
//!
//! [`Dispatcher::process`] walks the input in insertion order, with priority
//! keys moved to the front. For each key it:
//!
//! 1. follows the alias chain to the lookup key,
//! 2. picks the registered action, else the method named after the lookup key,
//! 3. invokes it with the lookup key and the original value, awaiting it
//!    before moving on.
//!
//! Keys that resolve to nothing are skipped unless the dispatcher is strict.
//! Under [`FailurePolicy::Continue`] the remaining keys are still dispatched
//! after a failure; either way only the first error is returned.

use crate::{
    alias::AliasTable,
    options::{DispatchOptions, FailurePolicy},
    registry::{Action, ActionRegistry},
};
use confmap_core::{
    BoxError, ConfigError, DynMethodProvider, EXPECTED_KEY_MESSAGE, Handler, Input, ValueError,
    type_name,
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::{
    future::Future,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};

/// The declarations governing one dispatcher.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    aliases: AliasTable,
    actions: ActionRegistry,
    first: Vec<String>,
}

impl Declaration {
    /// The alias table.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// The action registry.
    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Keys dispatched ahead of input order, in priority order.
    pub fn priority(&self) -> &[String] {
        &self.first
    }

    /// Priority of `key`, by its alias-resolved name or the method mapped to it.
    fn rank(&self, key: &str) -> usize {
        let Ok(resolved) = self.aliases.resolve(key) else {
            return usize::MAX;
        };
        let method = self
            .actions
            .get(&resolved)
            .and_then(Action::method_name)
            .unwrap_or(resolved.as_str());
        self.first
            .iter()
            .position(|f| *f == resolved || f == method)
            .unwrap_or(usize::MAX)
    }
}

/// Resolves input keys to actions and invokes them.
///
/// Declaration methods take `&self` and return `&Self`, so a dispatcher
/// attached to a shared target can still be configured fluently:
///
/// ```ignore
/// host.config()
///     .alias("a", "b")
///     .alias("b", "set")
///     .map("verbose", "option");
/// ```
pub struct Dispatcher {
    namespace: String,
    declaration: RwLock<Declaration>,
    target: Weak<dyn DynMethodProvider>,
    options: DispatchOptions,
}

impl Dispatcher {
    /// Create a dispatcher over `target`.
    ///
    /// The dispatcher never keeps the target alive; once the last strong
    /// reference is dropped, processing fails with [`ConfigError::Detached`].
    pub fn new(
        namespace: impl Into<String>,
        target: Weak<dyn DynMethodProvider>,
        options: DispatchOptions,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            declaration: RwLock::new(Declaration::default()),
            target,
            options,
        }
    }

    /// Create a dispatcher over `target` with default options.
    pub fn for_target<P: DynMethodProvider>(
        namespace: impl Into<String>,
        target: &Arc<P>,
    ) -> Self {
        let weak: Weak<dyn DynMethodProvider> = Arc::downgrade(target) as Weak<P>;
        Self::new(namespace, weak, DispatchOptions::default())
    }

    /// Name of this dispatcher, used in errors and logs.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The options this dispatcher was created with.
    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Check if the target is still alive.
    pub fn is_attached(&self) -> bool {
        self.target.strong_count() > 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Declaration> {
        self.declaration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Declaration> {
        self.declaration
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Declaration
    // ------------------------------------------------------------------

    /// Declare `from` as an alias of `to`.
    pub fn alias(&self, from: impl Into<String>, to: impl Into<String>) -> &Self {
        self.write().aliases.alias(from, to);
        self
    }

    /// Map `key` to an action; a string maps to the method of that name.
    pub fn map(&self, key: impl Into<String>, action: impl Into<Action>) -> &Self {
        self.write().actions.map(key, action);
        self
    }

    /// Map `key` to an async closure called with `(key, value)`.
    pub fn map_fn<F, Fut>(&self, key: impl Into<String>, func: F) -> &Self
    where
        F: Fn(String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        self.map(key, Action::handler(func))
    }

    /// Map `key` to a handler.
    pub fn map_handler<H: Handler>(&self, key: impl Into<String>, handler: H) -> &Self {
        self.map(key, Action::handler(handler))
    }

    /// Map `key` to a namespaced dispatcher.
    pub fn map_nested(&self, key: impl Into<String>, dispatcher: Arc<Dispatcher>) -> &Self {
        self.map(key, Action::Nested(dispatcher))
    }

    /// Map many keys at once.
    pub fn map_all<K, A, I>(&self, entries: I) -> &Self
    where
        K: Into<String>,
        A: Into<Action>,
        I: IntoIterator<Item = (K, A)>,
    {
        self.write().actions.map_all(entries);
        self
    }

    /// Remove the action registered for `key`.
    pub fn unmap(&self, key: &str) -> Option<Action> {
        self.write().actions.unmap(key)
    }

    /// Dispatch `key` before keys that are not declared first.
    ///
    /// Priority keys are compared against alias-resolved input keys and the
    /// method names mapped to them, and run in the order they were declared.
    pub fn first(&self, key: impl Into<String>) -> &Self {
        let key = key.into();
        let mut declaration = self.write();
        if !declaration.first.contains(&key) {
            declaration.first.push(key);
        }
        drop(declaration);
        self
    }

    /// Declare mappings from a loosely typed value.
    ///
    /// - a string maps the key to the method of the same name;
    /// - an object maps each entry; a string value names the method, `true`
    ///   or `null` maps the key to the method of the same name.
    ///
    /// Any other value fails with [`ConfigError::InvalidArgument`]. An object
    /// with an unusable entry is rejected as a whole.
    pub fn declare(&self, declaration: &Value) -> Result<&Self, ConfigError> {
        match declaration {
            Value::String(key) => Ok(self.map(key.as_str(), key.as_str())),
            Value::Object(entries) => {
                let mut actions = Vec::with_capacity(entries.len());
                for (key, action) in entries {
                    let name = match action {
                        Value::String(name) => name.clone(),
                        Value::Bool(true) | Value::Null => key.clone(),
                        _ => {
                            return Err(ConfigError::invalid_argument(format!(
                                "expected action for `{key}` to be a method name"
                            )));
                        }
                    };
                    actions.push((key.clone(), Action::Method(name)));
                }
                Ok(self.map_all(actions))
            }
            _ => Err(ConfigError::invalid_argument(EXPECTED_KEY_MESSAGE)),
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Follow the alias chain for `key`.
    pub fn resolve(&self, key: &str) -> Result<String, ConfigError> {
        self.read().aliases.resolve(key)
    }

    /// The action registered for `key`, if any. Aliases are not followed.
    pub fn action(&self, key: &str) -> Option<Action> {
        self.read().actions.get(key).cloned()
    }

    /// Registered keys, sorted.
    pub fn registered_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().actions.keys().map(str::to_owned).collect();
        keys.sort_unstable();
        keys
    }

    /// A snapshot of the current declaration.
    pub fn declaration(&self) -> Declaration {
        self.read().clone()
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Dispatch every key of `input`.
    ///
    /// Resolves to `Ok(())` once every action has settled successfully, or to
    /// the first error encountered.
    pub fn process(&self, input: Input) -> BoxFuture<'_, Result<(), ConfigError>> {
        async move {
            let Some(target) = self.target.upgrade() else {
                return Err(ConfigError::Detached {
                    namespace: self.namespace.clone(),
                });
            };

            let mut first_error = None;
            for (key, value) in self.order(input) {
                if let Err(err) = self.dispatch_key(target.as_ref(), key, value).await {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(namespace = %self.namespace, error = %err, "key failed");
                    if self.options.on_failure == FailurePolicy::Stop {
                        return Err(err);
                    }
                    first_error.get_or_insert(err);
                }
            }

            first_error.map_or(Ok(()), Err)
        }
        .boxed()
    }

    /// Dispatch every key of `input`, then call `done` exactly once.
    pub async fn process_with<F>(&self, input: Input, done: F)
    where
        F: FnOnce(Option<ConfigError>),
    {
        done(self.process(input).await.err());
    }

    /// Input entries with priority keys moved to the front.
    fn order(&self, input: Input) -> Vec<(String, Value)> {
        let declaration = self.read();
        let mut entries: Vec<(usize, String, Value)> = input
            .into_iter()
            .map(|(key, value)| (declaration.rank(&key), key, value))
            .collect();
        drop(declaration);

        // Stable: keys of equal rank keep insertion order.
        entries.sort_by_key(|(rank, _, _)| *rank);
        entries
            .into_iter()
            .map(|(_, key, value)| (key, value))
            .collect()
    }

    async fn dispatch_key(
        &self,
        target: &dyn DynMethodProvider,
        key: String,
        value: Value,
    ) -> Result<(), ConfigError> {
        let resolved = self.resolve(&key)?;
        let action = self
            .action(&resolved)
            .unwrap_or_else(|| Action::Method(resolved.clone()));

        #[cfg(feature = "tracing")]
        tracing::debug!(namespace = %self.namespace, %key, %resolved, ?action, "dispatching");

        match action {
            Action::Method(name) => match target.call_method_dyn(&name, value).await {
                Some(result) => result.map_err(|source| ConfigError::ActionFailure {
                    key: resolved,
                    source,
                }),
                None if self.options.strict => Err(ConfigError::UnresolvedAction { key: resolved }),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(
                        namespace = %self.namespace,
                        %key,
                        method = %name,
                        "no method, key skipped"
                    );
                    Ok(())
                }
            },
            Action::Handler(handler) => handler
                .call_dyn(resolved.clone(), value)
                .await
                .map_err(|source| ConfigError::ActionFailure {
                    key: resolved,
                    source,
                }),
            Action::Nested(nested) => match value {
                Value::Object(input) => nested.process(input).await,
                other => Err(ConfigError::action_failure(
                    resolved,
                    ValueError::ExpectedObject {
                        found: type_name(&other),
                    },
                )),
            },
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("namespace", &self.namespace)
            .field("declaration", &*self.read())
            .field("attached", &self.is_attached())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingHandler, RecordingTarget};
    use confmap_core::ErrorKind;
    use serde_json::json;

    fn input(value: Value) -> Input {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn dispatcher(target: &Arc<RecordingTarget>) -> Dispatcher {
        Dispatcher::for_target("test", target)
    }

    #[tokio::test]
    async fn test_empty_input_is_trivially_ok() {
        let target = Arc::new(RecordingTarget::with_methods(["set"]));
        dispatcher(&target).process(Input::new()).await.unwrap();
        assert!(target.calls().is_empty());
    }

    #[tokio::test]
    async fn test_handler_called_once_with_value() {
        let target = Arc::new(RecordingTarget::new());
        let recorder = RecordingHandler::new();
        let dispatcher = dispatcher(&target);
        dispatcher.map_handler("name", recorder.clone());

        dispatcher
            .process(input(json!({ "name": "confmap", "other": 1 })))
            .await
            .unwrap();

        assert_eq!(recorder.calls(), vec![("name".to_string(), json!("confmap"))]);
    }

    #[tokio::test]
    async fn test_alias_chain_reaches_method_with_lookup_key_value() {
        let target = Arc::new(RecordingTarget::with_methods(["set"]));
        let dispatcher = dispatcher(&target);
        dispatcher.alias("a", "b").alias("b", "c").alias("c", "set");

        dispatcher
            .process(input(json!({ "c": { "a": "b" } })))
            .await
            .unwrap();

        assert_eq!(target.calls(), vec![("set".to_string(), json!({ "a": "b" }))]);
    }

    #[tokio::test]
    async fn test_handler_receives_alias_target_as_key() {
        let target = Arc::new(RecordingTarget::new());
        let recorder = RecordingHandler::new();
        let dispatcher = dispatcher(&target);
        dispatcher.alias("v", "verbose").map_handler("verbose", recorder.clone());

        dispatcher.process(input(json!({ "v": true }))).await.unwrap();

        assert_eq!(recorder.calls(), vec![("verbose".to_string(), json!(true))]);
    }

    #[tokio::test]
    async fn test_mapped_method_name_differs_from_key() {
        let target = Arc::new(RecordingTarget::with_methods(["option"]));
        let dispatcher = dispatcher(&target);
        dispatcher.map("verbose", "option");

        dispatcher.process(input(json!({ "verbose": 3 }))).await.unwrap();

        assert_eq!(target.calls(), vec![("option".to_string(), json!(3))]);
    }

    #[tokio::test]
    async fn test_unknown_keys_are_skipped() {
        let target = Arc::new(RecordingTarget::with_methods(["set"]));
        let dispatcher = dispatcher(&target);

        dispatcher
            .process(input(json!({ "unknown": 1, "set": 2 })))
            .await
            .unwrap();

        assert_eq!(target.calls(), vec![("set".to_string(), json!(2))]);
    }

    #[tokio::test]
    async fn test_strict_reports_unresolved_key() {
        let target = Arc::new(RecordingTarget::with_methods(["set"]));
        let weak: Weak<dyn DynMethodProvider> = Arc::downgrade(&target) as Weak<RecordingTarget>;
        let dispatcher = Dispatcher::new("strict", weak, DispatchOptions::new().strict());

        let err = dispatcher
            .process(input(json!({ "unknown": 1, "set": 2 })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnresolvedAction);
        assert_eq!(err.key(), Some("unknown"));
        // Continue policy: later keys still run.
        assert_eq!(target.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_late_method_is_found_at_dispatch_time() {
        let target = Arc::new(RecordingTarget::new());
        let dispatcher = dispatcher(&target);
        dispatcher.map("greeting", "greet");

        target.add_method("greet");
        dispatcher
            .process(input(json!({ "greeting": "hi" })))
            .await
            .unwrap();

        assert_eq!(target.calls(), vec![("greet".to_string(), json!("hi"))]);
    }

    #[tokio::test]
    async fn test_continue_policy_reports_first_error_only() {
        let target = Arc::new(RecordingTarget::with_methods(["a", "b", "c", "d"]));
        target.fail_on("b");
        target.fail_on("c");
        let dispatcher = dispatcher(&target);

        let err = dispatcher
            .process(input(json!({ "a": 1, "b": 2, "c": 3, "d": 4 })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ActionFailure);
        assert_eq!(err.key(), Some("b"));
        let called: Vec<_> = target.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(called, ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_stop_policy_halts_at_first_error() {
        let target = Arc::new(RecordingTarget::with_methods(["a", "b", "c"]));
        target.fail_on("b");
        let weak: Weak<dyn DynMethodProvider> = Arc::downgrade(&target) as Weak<RecordingTarget>;
        let dispatcher = Dispatcher::new("stop", weak, DispatchOptions::new().stop_on_failure());

        let err = dispatcher
            .process(input(json!({ "a": 1, "b": 2, "c": 3 })))
            .await
            .unwrap_err();

        assert_eq!(err.key(), Some("b"));
        let called: Vec<_> = target.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(called, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_alias_cycle_fails_through_result() {
        let target = Arc::new(RecordingTarget::with_methods(["set"]));
        let dispatcher = dispatcher(&target);
        dispatcher.alias("x", "y").alias("y", "x");

        let err = dispatcher
            .process(input(json!({ "x": 1, "set": 2 })))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AliasCycle);
        assert_eq!(target.calls(), vec![("set".to_string(), json!(2))]);
    }

    #[tokio::test]
    async fn test_priority_keys_run_first() {
        let target = Arc::new(RecordingTarget::with_methods(["cwd", "use", "set"]));
        let dispatcher = dispatcher(&target);
        dispatcher.alias("dir", "cwd").first("cwd");

        dispatcher
            .process(input(json!({ "use": "a", "set": {}, "dir": "/tmp" })))
            .await
            .unwrap();

        let called: Vec<_> = target.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(called, ["cwd", "use", "set"]);
    }

    #[tokio::test]
    async fn test_key_mapped_to_priority_method_runs_first() {
        let target = Arc::new(RecordingTarget::with_methods(["cwd", "use"]));
        let dispatcher = dispatcher(&target);
        dispatcher.map("dir", "cwd").first("cwd");

        dispatcher
            .process(input(json!({ "use": "a", "dir": "/srv" })))
            .await
            .unwrap();

        assert_eq!(
            target.calls(),
            vec![
                ("cwd".to_string(), json!("/srv")),
                ("use".to_string(), json!("a")),
            ]
        );
    }

    #[tokio::test]
    async fn test_nested_dispatch_recurses() {
        let outer_target = Arc::new(RecordingTarget::new());
        let inner_target = Arc::new(RecordingTarget::with_methods(["set"]));
        let inner = Arc::new(Dispatcher::for_target("store", &inner_target));
        let outer = dispatcher(&outer_target);
        outer.map_nested("store", inner);

        outer
            .process(input(json!({ "store": { "set": { "a": "b" } } })))
            .await
            .unwrap();

        assert_eq!(inner_target.calls(), vec![("set".to_string(), json!({ "a": "b" }))]);
        assert!(outer_target.calls().is_empty());

        let err = outer
            .process(input(json!({ "store": "nope" })))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ActionFailure);
        assert_eq!(err.key(), Some("store"));
    }

    #[tokio::test]
    async fn test_detached_dispatcher() {
        let target = Arc::new(RecordingTarget::with_methods(["set"]));
        let dispatcher = dispatcher(&target);
        drop(target);

        assert!(!dispatcher.is_attached());
        let err = dispatcher.process(Input::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Detached);
    }

    #[tokio::test]
    async fn test_process_with_calls_done_once() {
        let target = Arc::new(RecordingTarget::with_methods(["a"]));
        target.fail_on("a");
        let dispatcher = dispatcher(&target);

        let mut outcomes = Vec::new();
        dispatcher
            .process_with(input(json!({ "a": 1 })), |err| outcomes.push(err))
            .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].as_ref().and_then(ConfigError::key), Some("a"));
    }

    #[test]
    fn test_declare_forms() {
        let target = Arc::new(RecordingTarget::new());
        let dispatcher = dispatcher(&target);

        dispatcher.declare(&json!("set")).unwrap();
        dispatcher
            .declare(&json!({ "verbose": "option", "data": true }))
            .unwrap();

        assert_eq!(dispatcher.registered_keys(), ["data", "set", "verbose"]);
        assert_eq!(
            dispatcher.action("verbose").as_ref().and_then(Action::method_name),
            Some("option")
        );
        assert_eq!(
            dispatcher.action("data").as_ref().and_then(Action::method_name),
            Some("data")
        );
    }

    #[test]
    fn test_declare_rejects_other_values() {
        let target = Arc::new(RecordingTarget::new());
        let dispatcher = dispatcher(&target);

        for bad in [json!([]), json!(1), json!(null), json!(false)] {
            let err = dispatcher.declare(&bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert_eq!(err.to_string(), "expected key to be a string or object");
        }

        let err = dispatcher
            .declare(&json!({ "ok": "set", "bad": 1 }))
            .unwrap_err();
        assert_eq!(err.to_string(), "expected action for `bad` to be a method name");
        assert!(dispatcher.registered_keys().is_empty());
    }
}
