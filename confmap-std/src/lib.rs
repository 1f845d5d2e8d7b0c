//! # confmap-std
//!
//! Standard implementations for the confmap key-to-action dispatcher.
//!
//! This crate provides:
//! - **Declarations**: [`AliasTable`], [`ActionRegistry`]
//! - **Dispatch**: [`Dispatcher`] with [`DispatchOptions`]
//! - **Host binding**: [`Host`], [`Store`], [`bind`], [`bind_store`]
//! - **Built-ins**: `set`, `get`, `has`, `del`, `option`, `data`, `cwd`, `use`
//! - **Plugins**: [`PluginLoader`], [`RegistryLoader`]
//! - **Standard handlers**: Logging, Timeout

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use confmap_core;

// Modules
pub mod alias;
pub mod binding;
pub mod builtins;
pub mod dispatcher;
pub mod handlers;
pub mod host;
pub mod loader;
pub mod notify;
pub mod options;
pub mod registry;
pub mod store;
pub mod testing;

pub use alias::AliasTable;
pub use binding::{STORE_KEY, bind, bind_store};
pub use builtins::{BUILTIN_KEYS, UseError, UseMethod};
pub use dispatcher::{Declaration, Dispatcher};
pub use host::{CWD_OPTION, Host, HostBuilder};
pub use loader::{
    DynPlugin, DynPluginLoader, FnPlugin, LoadError, Plugin, PluginLoader, Reference,
    RegistryLoader,
};
pub use notify::{DEFAULT_CAPACITY, Notifier};
pub use options::{DispatchOptions, FailurePolicy};
pub use registry::{Action, ActionRegistry};
pub use store::{STORE_METHODS, Store, StoreError};
