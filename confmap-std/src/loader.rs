//! # Plugins and loaders
//!
//! The `use` key names plugins by reference. A [`PluginLoader`] turns a
//! [`Reference`] into a [`Plugin`], and the plugin is then applied to the
//! [`Host`], usually defining new methods on it.

use crate::host::Host;
use confmap_core::BoxError;
use std::{
    collections::HashMap,
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
    sync::{Arc, PoisonError, RwLock},
};
use thiserror::Error;

/// A plugin reference as written in the input, and where it points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    raw: String,
    path: PathBuf,
}

impl Reference {
    /// Resolve `raw` against `cwd`. Absolute references are kept as is.
    pub fn resolve(raw: impl Into<String>, cwd: Option<&Path>) -> Self {
        let raw = raw.into();
        let path = match cwd {
            Some(dir) if Path::new(&raw).is_relative() => dir.join(&raw),
            _ => PathBuf::from(&raw),
        };
        Self { raw, path }
    }

    /// The reference as written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The resolved path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last path component, if it is valid UTF-8.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Errors raised while loading a plugin.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No plugin is known under the reference.
    #[error("plugin `{reference}` not found (resolved to `{}`)", path.display())]
    NotFound {
        /// The reference as written.
        reference: String,
        /// The resolved path.
        path: PathBuf,
    },

    /// The loader found the plugin but could not produce it.
    #[error("plugin `{reference}` failed to load: {source}")]
    Failed {
        /// The reference as written.
        reference: String,
        /// Underlying error.
        #[source]
        source: BoxError,
    },
}

impl LoadError {
    /// Build a [`LoadError::NotFound`] for `reference`.
    pub fn not_found(reference: &Reference) -> Self {
        LoadError::NotFound {
            reference: reference.raw().to_owned(),
            path: reference.path().to_path_buf(),
        }
    }
}

// ============================================================================
// Plugin
// ============================================================================

/// Something that extends a host once loaded.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a confmap `Plugin`",
    label = "missing `Plugin` implementation",
    note = "Plugins must implement `apply(host)`."
)]
pub trait Plugin: Send + Sync + 'static {
    /// Apply the plugin to `host`.
    fn apply(&self, host: &Host) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe version of [`Plugin`].
pub trait DynPlugin: Send + Sync + 'static {
    /// Apply the plugin (dynamic dispatch version).
    fn apply_dyn<'a>(
        &'a self,
        host: &'a Host,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;
}

impl<P: Plugin> DynPlugin for P {
    fn apply_dyn<'a>(
        &'a self,
        host: &'a Host,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>> {
        Box::pin(self.apply(host))
    }
}

/// A synchronous plugin built from a closure.
///
/// ```rust,ignore
/// let plugin = FnPlugin::new(|host: &Host| {
///     host.define_fn("greet", |host, value| {
///         host.emit(Notification::new("greet", [value]));
///         Ok(())
///     });
///     Ok(())
/// });
/// ```
pub struct FnPlugin<F> {
    func: F,
}

impl<F> FnPlugin<F> {
    /// Wrap a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(&Host) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn apply(&self, host: &Host) -> Result<(), BoxError> {
        (self.func)(host)
    }
}

// ============================================================================
// Loader
// ============================================================================

/// Resolves references to plugins.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a confmap `PluginLoader`",
    label = "missing `PluginLoader` implementation",
    note = "Loaders must implement `load(reference)`."
)]
pub trait PluginLoader: Send + Sync + 'static {
    /// Load the plugin named by `reference`.
    fn load(
        &self,
        reference: &Reference,
    ) -> impl Future<Output = Result<Arc<dyn DynPlugin>, LoadError>> + Send;
}

/// Object-safe version of [`PluginLoader`].
pub trait DynPluginLoader: Send + Sync + 'static {
    /// Load a plugin (dynamic dispatch version).
    fn load_dyn<'a>(
        &'a self,
        reference: &'a Reference,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn DynPlugin>, LoadError>> + Send + 'a>>;
}

impl<L: PluginLoader> DynPluginLoader for L {
    fn load_dyn<'a>(
        &'a self,
        reference: &'a Reference,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<dyn DynPlugin>, LoadError>> + Send + 'a>> {
        Box::pin(self.load(reference))
    }
}

/// A loader over plugins registered in memory.
///
/// A reference matches a registration by its resolved path, then by the
/// reference as written, then by its file name.
#[derive(Default)]
pub struct RegistryLoader {
    plugins: RwLock<HashMap<String, Arc<dyn DynPlugin>>>,
}

impl RegistryLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `plugin` under `name`.
    pub fn register<P: Plugin>(&self, name: impl Into<String>, plugin: P) -> &Self {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Arc::new(plugin));
        self
    }

    /// Check if a plugin is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    fn lookup(&self, reference: &Reference) -> Option<Arc<dyn DynPlugin>> {
        let plugins = self.plugins.read().unwrap_or_else(PoisonError::into_inner);
        let path = reference.path().to_string_lossy();
        [Some(&*path), Some(reference.raw()), reference.file_name()]
            .into_iter()
            .flatten()
            .find_map(|name| plugins.get(name).cloned())
    }
}

impl PluginLoader for RegistryLoader {
    async fn load(&self, reference: &Reference) -> Result<Arc<dyn DynPlugin>, LoadError> {
        self.lookup(reference)
            .ok_or_else(|| LoadError::not_found(reference))
    }
}

impl std::fmt::Debug for RegistryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plugins = self.plugins.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("RegistryLoader")
            .field("plugins", &plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}
