//! Timeout wrapper for time-limited handlers.

use confmap_core::{BoxError, Handler};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Error returned when a handler runs past its deadline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("handler for key `{key}` timed out after {elapsed:?}")]
pub struct TimeoutError {
    /// The dispatched key.
    pub key: String,
    /// The deadline that was exceeded.
    pub elapsed: Duration,
}

/// A handler that fails with [`TimeoutError`] if `inner` takes too long.
///
/// The dispatcher awaits each key in turn, so a hung action hangs the whole
/// `process` call; wrap slow handlers in this to bound them.
pub struct TimeoutHandler<H> {
    inner: H,
    duration: Duration,
}

impl<H> TimeoutHandler<H> {
    /// Wrap `inner` with a deadline.
    pub fn new(inner: H, duration: Duration) -> Self {
        Self { inner, duration }
    }
}

impl<H: Handler> Handler for TimeoutHandler<H> {
    async fn call(&self, key: String, value: Value) -> Result<(), BoxError> {
        match timeout(self.duration, self.inner.call(key.clone(), value)).await {
            Ok(result) => result,
            Err(_) => Err(Box::new(TimeoutError {
                key,
                elapsed: self.duration,
            })),
        }
    }
}
