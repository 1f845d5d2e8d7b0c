#![allow(dead_code)]

use confmap::{
    Host, Input, Notification, Value,
    testing::{RecordingLoader, drain},
};
use std::sync::Arc;
use tokio::sync::broadcast;

// ============================================================================
// Input helpers
// ============================================================================

/// Turn a `json!` object into dispatcher input.
pub fn input(value: Value) -> Input {
    match value {
        Value::Object(map) => map,
        other => panic!("test input must be an object, got {other}"),
    }
}

// ============================================================================
// Hosts
// ============================================================================

/// A host with a recording loader and a store.
pub fn host_with_loader() -> (Arc<Host>, RecordingLoader) {
    let loader = RecordingLoader::new();
    let host = Host::builder()
        .name("app")
        .with_store()
        .shared_loader(Arc::new(loader.clone()))
        .build();
    (host, loader)
}

// ============================================================================
// Notifications
// ============================================================================

/// Pending notifications, as `(event, args)` pairs.
pub fn events(rx: &mut broadcast::Receiver<Notification>) -> Vec<(String, Vec<Value>)> {
    drain(rx)
        .into_iter()
        .map(|note| (note.event, note.args))
        .collect()
}

/// Pending notification names.
pub fn event_names(rx: &mut broadcast::Receiver<Notification>) -> Vec<String> {
    drain(rx).into_iter().map(|note| note.event).collect()
}
