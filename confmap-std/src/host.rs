//! # Host
//!
//! The application object a dispatcher is bound to. A [`Host`] is an explicit
//! capability registry: methods are defined by name and looked up when a key
//! is dispatched, so plugins can extend a host after it was bound.
//!
//! Besides its methods a host carries options, data, an internal cache store
//! for the built-in `set`/`get`/`has`/`del` keys, an optional `store`
//! capability, an optional plugin loader and a [`Notifier`].

use crate::{
    dispatcher::Dispatcher,
    loader::{DynPluginLoader, PluginLoader},
    notify::{DEFAULT_CAPACITY, Notifier},
    options::DispatchOptions,
    store::Store,
};
use confmap_core::{BoxError, DynMethod, FnMethod, Input, Method, MethodProvider, Notification};
use serde_json::Value;
use std::{
    collections::{HashMap, hash_map::Entry},
    path::PathBuf,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};
use tokio::sync::broadcast;

type MethodMap = HashMap<String, Arc<dyn DynMethod<Host>>>;

/// Option key holding the working directory used to resolve plugin references.
pub const CWD_OPTION: &str = "cwd";

/// A dispatch target with named methods.
pub struct Host {
    name: String,
    methods: RwLock<MethodMap>,
    options: RwLock<Input>,
    data: RwLock<Input>,
    cache: Store,
    store: Option<Arc<Store>>,
    loader: Option<Arc<dyn DynPluginLoader>>,
    notifier: Notifier,
    dispatch_options: DispatchOptions,
    pub(crate) config: OnceLock<Arc<Dispatcher>>,
}

impl Host {
    /// Create a host with default settings.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::builder().name(name).build()
    }

    /// Start building a host.
    pub fn builder() -> HostBuilder {
        HostBuilder::default()
    }

    /// Name of the host, also the namespace of its dispatcher.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The host's dispatcher, once bound.
    pub fn config(&self) -> Option<Arc<Dispatcher>> {
        self.config.get().cloned()
    }

    /// Options used when the host's dispatcher is created.
    pub fn dispatch_options(&self) -> DispatchOptions {
        self.dispatch_options
    }

    // ------------------------------------------------------------------
    // Methods
    // ------------------------------------------------------------------

    /// Define a method, replacing any previous one with that name.
    pub fn define<M: Method<Host>>(&self, name: impl Into<String>, method: M) -> &Self {
        let name = name.into();
        #[cfg(feature = "tracing")]
        tracing::trace!(host = %self.name, method = %name, "define");
        self.methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(method));
        self
    }

    /// Define a synchronous method from a closure.
    pub fn define_fn<F>(&self, name: impl Into<String>, func: F) -> &Self
    where
        F: Fn(&Host, Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.define(name, FnMethod::new(func))
    }

    /// Define a method unless one with that name already exists.
    ///
    /// Returns `true` if the method was added.
    pub fn define_default<M: Method<Host>>(&self, name: impl Into<String>, method: M) -> bool {
        let mut methods = self.methods.write().unwrap_or_else(PoisonError::into_inner);
        match methods.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(method));
                true
            }
        }
    }

    /// Remove a method. Returns `true` if it existed.
    pub fn remove_method(&self, name: &str) -> bool {
        self.methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Names of the defined methods, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let methods = self.methods.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = methods.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn method(&self, name: &str) -> Option<Arc<dyn DynMethod<Host>>> {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    // ------------------------------------------------------------------
    // Options and data
    // ------------------------------------------------------------------

    /// Read an option.
    pub fn option(&self, key: &str) -> Option<Value> {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Set an option.
    pub fn set_option(&self, key: impl Into<String>, value: Value) {
        self.options
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    /// A copy of every option.
    pub fn options(&self) -> Input {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The working directory option, if set to a string.
    pub fn cwd(&self) -> Option<PathBuf> {
        match self.option(CWD_OPTION)? {
            Value::String(dir) => Some(PathBuf::from(dir)),
            _ => None,
        }
    }

    /// Read a data entry.
    pub fn data(&self, key: &str) -> Option<Value> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Set a data entry.
    pub fn set_data(&self, key: impl Into<String>, value: Value) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    /// A copy of every data entry.
    pub fn data_entries(&self) -> Input {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    /// The internal store behind the built-in `set`/`get`/`has`/`del` keys.
    pub fn cache(&self) -> &Store {
        &self.cache
    }

    /// The `store` capability, if the host has one.
    pub fn store(&self) -> Option<&Arc<Store>> {
        self.store.as_ref()
    }

    /// The plugin loader used by `use`, if any.
    pub fn loader(&self) -> Option<&Arc<dyn DynPluginLoader>> {
        self.loader.as_ref()
    }

    /// The host's notifier.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Publish a notification on the host's channel.
    pub fn emit(&self, notification: Notification) {
        self.notifier.emit(notification);
    }

    /// Subscribe to the host's notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }
}

impl MethodProvider for Host {
    fn has_method(&self, name: &str) -> bool {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    async fn call_method(&self, name: &str, value: Value) -> Option<Result<(), BoxError>> {
        let method = self.method(name)?;
        Some(method.call_dyn(self, value).await)
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .field("store", &self.store)
            .field("bound", &self.config.get().is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Host`].
///
/// # Example
/// ```ignore
/// let host = Host::builder()
///     .name("app")
///     .with_store()
///     .loader(RegistryLoader::new())
///     .dispatch_options(DispatchOptions::new().strict())
///     .build();
/// ```
pub struct HostBuilder {
    name: String,
    capacity: usize,
    store: StoreSetting,
    loader: Option<Arc<dyn DynPluginLoader>>,
    dispatch_options: DispatchOptions,
}

enum StoreSetting {
    None,
    Fresh,
    Shared(Arc<Store>),
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self {
            name: "host".to_owned(),
            capacity: DEFAULT_CAPACITY,
            store: StoreSetting::None,
            loader: None,
            dispatch_options: DispatchOptions::default(),
        }
    }
}

impl HostBuilder {
    /// Set the host name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the notification buffer size of the host (and of a fresh store).
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Give the host a fresh `store` capability with its own channel.
    pub fn with_store(mut self) -> Self {
        self.store = StoreSetting::Fresh;
        self
    }

    /// Give the host an existing store as its `store` capability.
    pub fn store(mut self, store: Arc<Store>) -> Self {
        self.store = StoreSetting::Shared(store);
        self
    }

    /// Set the plugin loader used by `use`.
    pub fn loader<L: PluginLoader>(mut self, loader: L) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Set a shared plugin loader.
    pub fn shared_loader(mut self, loader: Arc<dyn DynPluginLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the options of the host's dispatcher.
    pub fn dispatch_options(mut self, options: DispatchOptions) -> Self {
        self.dispatch_options = options;
        self
    }

    /// Build the host.
    pub fn build(self) -> Arc<Host> {
        let notifier = Notifier::new(self.capacity);
        let store = match self.store {
            StoreSetting::None => None,
            StoreSetting::Fresh => {
                Some(Arc::new(Store::new("store", Notifier::new(self.capacity))))
            }
            StoreSetting::Shared(store) => Some(store),
        };

        Arc::new(Host {
            cache: Store::new(format!("{}.cache", self.name), notifier.clone()),
            name: self.name,
            methods: RwLock::new(HashMap::new()),
            options: RwLock::new(Input::new()),
            data: RwLock::new(Input::new()),
            store,
            loader: self.loader,
            notifier,
            dispatch_options: self.dispatch_options,
            config: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_methods_are_looked_up_by_name() {
        let host = Host::new("app");
        host.define_fn("greet", |host, value| {
            host.emit(Notification::new("greet", [value]));
            Ok(())
        });
        let mut rx = host.subscribe();

        assert!(host.has_method("greet"));
        assert!(matches!(host.call_method("greet", json!("hi")).await, Some(Ok(()))));
        assert!(host.call_method("missing", Value::Null).await.is_none());
        assert_eq!(rx.try_recv().unwrap(), Notification::new("greet", [json!("hi")]));
    }

    #[test]
    fn test_define_default_keeps_existing() {
        let host = Host::new("app");
        host.define_fn("set", |host, _| {
            host.set_data("custom", Value::Bool(true));
            Ok(())
        });

        let noop = FnMethod::new(|_: &Host, _: Value| -> Result<(), BoxError> { Ok(()) });
        let added = host.define_default("set", noop);
        assert!(!added);
        assert!(host.remove_method("set"));
        assert!(!host.remove_method("set"));
    }

    #[test]
    fn test_cwd_comes_from_options() {
        let host = Host::new("app");
        assert_eq!(host.cwd(), None);
        host.set_option(CWD_OPTION, json!("/srv/app"));
        assert_eq!(host.cwd(), Some(PathBuf::from("/srv/app")));
        host.set_option(CWD_OPTION, json!(1));
        assert_eq!(host.cwd(), None);
    }

    #[test]
    fn test_builder_store_has_own_channel() {
        let host = Host::builder().name("app").with_store().capacity(4).build();
        let store = host.store().unwrap();
        let mut host_rx = host.subscribe();
        let mut store_rx = store.subscribe();

        store.set("a", json!(1));

        assert!(host_rx.try_recv().is_err());
        assert!(store_rx.try_recv().unwrap().is("set"));
        assert_eq!(host.cache().name(), "app.cache");
    }
}
