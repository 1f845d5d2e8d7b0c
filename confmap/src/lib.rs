//! # confmap - Declarative Key-to-Action Dispatch
//!
//! `confmap` turns a configuration object into a sequence of actions. Each
//! top-level key is resolved through an alias table to an action: a method of
//! the bound host, an explicitly supplied handler, or a nested dispatcher
//! that receives the key's value as its own input.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use confmap::prelude::*;
//! use serde_json::json;
//!
//! let host = Host::builder().name("app").with_store().build();
//! let config = bind(&host);
//! config.alias("dir", "cwd").alias("plugins", "use");
//!
//! let input = json!({
//!     "set": { "name": "demo" },
//!     "store": { "set": { "token": "abc" } },
//!     "dir": "/srv/app",
//! });
//! config.process(as_object(&input)?.clone()).await?;
//! ```
//!
//! Keys run in input order, one at a time, except priority keys (`cwd` by
//! default) which run first. Keys that resolve to nothing are skipped unless
//! the dispatcher is strict.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use confmap_core::{
    // Error types
    BoxError,
    ConfigError,
    // Method
    DynHandler,
    DynMethod,
    DynMethodProvider,
    EXPECTED_KEY_MESSAGE,
    ErrorKind,
    FnMethod,
    // Handler
    Handler,
    // Values
    Input,
    Method,
    MethodProvider,
    // Notification
    Notification,
    Value,
    ValueError,
    as_object,
    as_str,
    key_list,
    type_name,
};

// Dispatch
pub use confmap_std::{
    Action, ActionRegistry, AliasTable, Declaration, DispatchOptions, Dispatcher, FailurePolicy,
};

// Host binding
pub use confmap_std::{
    BUILTIN_KEYS, CWD_OPTION, DEFAULT_CAPACITY, Host, HostBuilder, Notifier, STORE_KEY,
    STORE_METHODS, Store, StoreError, UseError, UseMethod, bind, bind_store,
};

// Plugins
pub use confmap_std::{
    DynPlugin, DynPluginLoader, FnPlugin, LoadError, Plugin, PluginLoader, Reference,
    RegistryLoader,
};

/// Standard handler wrappers.
pub mod handlers {
    #![allow(clippy::wildcard_imports)]
    pub use confmap_std::handlers::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use confmap_std::testing::*;
}

/// Prelude module - common imports for confmap.
///
/// # Usage
///
/// ```rust,ignore
/// use confmap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Dispatch
        Action,
        // Errors
        BoxError,
        ConfigError,
        DispatchOptions,
        Dispatcher,
        ErrorKind,
        FnMethod,
        // Core traits
        Handler,
        // Host binding
        Host,
        Input,
        Method,
        MethodProvider,
        Notification,
        Plugin,
        PluginLoader,
        RegistryLoader,
        Store,
        Value,
        as_object,
        bind,
    };
}
