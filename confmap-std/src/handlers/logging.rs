//! Logging wrapper for handler observation.

use confmap_core::{BoxError, Handler};
use serde_json::Value;

/// A handler that logs each call before delegating to `inner`.
///
/// Failures are logged at `warn` and returned unchanged.
pub struct LoggingHandler<H> {
    inner: H,
    label: &'static str,
}

impl<H> LoggingHandler<H> {
    /// Wrap `inner`, tagging log events with `label`.
    pub fn new(label: &'static str, inner: H) -> Self {
        Self { inner, label }
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Handler> Handler for LoggingHandler<H> {
    async fn call(&self, key: String, value: Value) -> Result<(), BoxError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(label = self.label, %key, ?value, "handler called");
        #[cfg(not(feature = "tracing"))]
        let _ = self.label;

        let result = self.inner.call(key, value).await;

        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            tracing::warn!(label = self.label, error = %err, "handler failed");
        }
        result
    }
}
