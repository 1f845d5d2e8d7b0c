//! # Handlers
//!
//! A [`Handler`] is an explicitly supplied callable bound to a key. When the
//! dispatcher reaches that key it calls the handler with the key used for the
//! lookup (the alias target, if the key was aliased) and the original value.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `|key, value| async move { ... }`
//! 2. **Struct implementation**: `impl Handler for MyHandler`
//! 3. **Wrapped**: handler wrappers in `confmap-std` (logging, timeout)

use crate::error::BoxError;
use serde_json::Value;
use std::{future::Future, pin::Pin};

/// A callable action invoked with `(key, value)`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a confmap `Handler`",
    label = "missing `Handler` implementation",
    note = "Handlers must implement `call(key, value)` returning `Result<(), BoxError>`."
)]
pub trait Handler: Send + Sync + 'static {
    /// Executes the handler logic.
    fn call(&self, key: String, value: Value)
    -> impl Future<Output = Result<(), BoxError>> + Send;
}

// Blanket impl for closures
impl<F, Fut> Handler for F
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send,
{
    fn call(&self, key: String, value: Value) -> impl Future<Output = Result<(), BoxError>> + Send {
        (self)(key, value)
    }
}

/// Object-safe version of [`Handler`].
///
/// Use this trait when handlers are stored behind a pointer, e.g. in a registry.
pub trait DynHandler: Send + Sync + 'static {
    /// Executes the handler logic (dynamic dispatch version).
    fn call_dyn<'a>(
        &'a self,
        key: String,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;
}

impl<H: Handler> DynHandler for H {
    fn call_dyn<'a>(
        &'a self,
        key: String,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>> {
        Box::pin(self.call(key, value))
    }
}
