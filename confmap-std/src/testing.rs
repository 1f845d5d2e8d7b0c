//! Testing utilities for confmap.
//!
//! This module provides utilities to make testing dispatchers, handlers and
//! plugins easier.
//!
//! # Features
//!
//! - [`RecordingHandler`]: A handler that records every `(key, value)` call
//! - [`RecordingTarget`]: A method provider with programmable methods
//! - [`RecordingLoader`]: A plugin loader that records the references it loads
//! - [`NoopPlugin`]: A plugin that does nothing
//! - [`drain`]: Collect the pending notifications of a receiver

use crate::{
    host::Host,
    loader::{DynPlugin, LoadError, Plugin, PluginLoader, Reference},
};
use confmap_core::{BoxError, Handler, MethodProvider, Notification};
use serde_json::Value;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};
use tokio::sync::broadcast;

type Calls = Arc<Mutex<Vec<(String, Value)>>>;

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records all calls it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::new();
/// dispatcher.map_handler("name", recorder.clone());
///
/// dispatcher.process(input).await?;
///
/// assert_eq!(recorder.calls().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct RecordingHandler {
    calls: Calls,
    error: Option<String>,
}

impl RecordingHandler {
    /// Create a recording handler that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recording handler that fails with `message` after recording.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Calls::default(),
            error: Some(message.into()),
        }
    }

    /// Get a clone of the recorded calls.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Clear all recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Handler for RecordingHandler {
    async fn call(&self, key: String, value: Value) -> Result<(), BoxError> {
        self.calls.lock().unwrap().push((key, value));
        match &self.error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Recording Target
// ============================================================================

/// A method provider whose methods only record their calls.
///
/// Methods can be added after a dispatcher is attached, and individual
/// methods can be told to fail.
#[derive(Default)]
pub struct RecordingTarget {
    methods: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    calls: Calls,
}

impl RecordingTarget {
    /// Create a target with no methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a target with the given methods.
    pub fn with_methods<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = Self::new();
        for name in names {
            target.add_method(name);
        }
        target
    }

    /// Add a method.
    pub fn add_method(&self, name: impl Into<String>) {
        self.methods.lock().unwrap().insert(name.into());
    }

    /// Make the method `name` fail after recording its call.
    pub fn fail_on(&self, name: impl Into<String>) {
        self.failing.lock().unwrap().insert(name.into());
    }

    /// Get a clone of the recorded `(method, value)` calls.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl MethodProvider for RecordingTarget {
    fn has_method(&self, name: &str) -> bool {
        self.methods.lock().unwrap().contains(name)
    }

    async fn call_method(&self, name: &str, value: Value) -> Option<Result<(), BoxError>> {
        if !self.has_method(name) {
            return None;
        }
        self.calls.lock().unwrap().push((name.to_owned(), value));
        if self.failing.lock().unwrap().contains(name) {
            return Some(Err(format!("method `{name}` failed").into()));
        }
        Some(Ok(()))
    }
}

// ============================================================================
// Plugins and loaders
// ============================================================================

/// A plugin that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlugin;

impl Plugin for NoopPlugin {
    async fn apply(&self, _host: &Host) -> Result<(), BoxError> {
        Ok(())
    }
}

/// A loader that records every reference and hands out [`NoopPlugin`]s.
///
/// # Example
///
/// ```rust,ignore
/// let loader = RecordingLoader::new();
/// let host = Host::builder().shared_loader(Arc::new(loader.clone())).build();
///
/// bind(&host).process(input).await?;
///
/// assert_eq!(loader.raw_references(), ["a", "b"]);
/// ```
#[derive(Clone, Default)]
pub struct RecordingLoader {
    references: Arc<Mutex<Vec<Reference>>>,
    missing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingLoader {
    /// Create a loader that finds every reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make loading `raw` fail with [`LoadError::NotFound`].
    pub fn missing(&self, raw: impl Into<String>) -> &Self {
        self.missing.lock().unwrap().insert(raw.into());
        self
    }

    /// Get a clone of the loaded references, in load order.
    pub fn references(&self) -> Vec<Reference> {
        self.references.lock().unwrap().clone()
    }

    /// The loaded references as written.
    pub fn raw_references(&self) -> Vec<String> {
        self.references()
            .iter()
            .map(|reference| reference.raw().to_owned())
            .collect()
    }
}

impl PluginLoader for RecordingLoader {
    async fn load(&self, reference: &Reference) -> Result<Arc<dyn DynPlugin>, LoadError> {
        self.references.lock().unwrap().push(reference.clone());
        if self.missing.lock().unwrap().contains(reference.raw()) {
            return Err(LoadError::not_found(reference));
        }
        Ok(Arc::new(NoopPlugin))
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Collect every notification currently queued on `receiver`.
///
/// Stops at the first empty read; lagged notifications are skipped.
pub fn drain(receiver: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut notifications = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(notification) => notifications.push(notification),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    notifications
}
