//! Attaching dispatchers to hosts and stores.

use crate::{
    builtins,
    dispatcher::Dispatcher,
    host::Host,
    store::{STORE_METHODS, Store},
};
use confmap_core::DynMethodProvider;
use std::sync::{Arc, Weak};

/// Key under which a host's store dispatcher is mapped.
pub const STORE_KEY: &str = "store";

/// Bind a dispatcher to `host`, creating it on first call.
///
/// The first call installs the built-in methods and, if the host has a store,
/// maps [`STORE_KEY`] to the store's own dispatcher. Later calls return the
/// same dispatcher without touching the host.
pub fn bind(host: &Arc<Host>) -> Arc<Dispatcher> {
    host.config
        .get_or_init(|| {
            let target: Weak<dyn DynMethodProvider> = Arc::downgrade(host) as Weak<Host>;
            let dispatcher = Arc::new(Dispatcher::new(
                host.name(),
                target,
                host.dispatch_options(),
            ));
            builtins::install(host, &dispatcher);

            if let Some(store) = host.store() {
                dispatcher.map_nested(STORE_KEY, bind_store(store));
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(host = %host.name(), store = host.store().is_some(), "host bound");
            dispatcher
        })
        .clone()
}

/// Bind an independent dispatcher to `store`, creating it on first call.
///
/// The store's dispatcher maps `set`, `get`, `has` and `del` to the store's own
/// operations.
pub fn bind_store(store: &Arc<Store>) -> Arc<Dispatcher> {
    store
        .config
        .get_or_init(|| {
            let dispatcher = Arc::new(Dispatcher::for_target(store.name(), store));
            dispatcher.map_all(STORE_METHODS.map(|key| (key, key)));
            dispatcher
        })
        .clone()
}
