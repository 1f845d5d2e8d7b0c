//! # Methods and method providers
//!
//! A *method* is a named capability attached to a dispatch target (a host
//! application object, a store, ...). Dispatchers never hold methods directly:
//! they hold a [`MethodProvider`] and look methods up by name at dispatch time,
//! so methods attached after the dispatcher was declared are still found.

use crate::error::BoxError;
use serde_json::Value;
use std::{future::Future, pin::Pin};

/// A named capability invoked against a target of type `T`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Method` of `{T}`",
    label = "missing `Method<{T}>` implementation",
    note = "Methods must implement `call(target, value)` for the target type `{T}`."
)]
pub trait Method<T: ?Sized>: Send + Sync + 'static {
    /// Invoke the method with the dispatched value.
    fn call(&self, target: &T, value: Value) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe version of [`Method`].
pub trait DynMethod<T: ?Sized>: Send + Sync + 'static {
    /// Invoke the method (dynamic dispatch version).
    fn call_dyn<'a>(
        &'a self,
        target: &'a T,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;
}

impl<T: ?Sized, M: Method<T>> DynMethod<T> for M {
    fn call_dyn<'a>(
        &'a self,
        target: &'a T,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>> {
        Box::pin(self.call(target, value))
    }
}

/// A synchronous method built from a closure.
///
/// ```rust,ignore
/// host.define("greet", FnMethod::new(|host: &Host, value| {
///     host.emit(Notification::new("greet", [value]));
///     Ok(())
/// }));
/// ```
pub struct FnMethod<F> {
    func: F,
}

impl<F> FnMethod<F> {
    /// Wrap a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<T, F> Method<T> for FnMethod<F>
where
    T: ?Sized + Sync,
    F: Fn(&T, Value) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn call(&self, target: &T, value: Value) -> Result<(), BoxError> {
        (self.func)(target, value)
    }
}

/// A target that exposes methods by name.
///
/// `call_method` returns `None` when no method with that name is attached,
/// which lets the dispatcher apply its unknown-key policy.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid MethodProvider",
    label = "missing `MethodProvider` implementation",
    note = "Implement `MethodProvider` to let a dispatcher resolve methods on this type."
)]
pub trait MethodProvider: Send + Sync + 'static {
    /// Check whether a method named `name` is currently attached.
    fn has_method(&self, name: &str) -> bool;

    /// Invoke the method named `name`, or return `None` if it does not exist.
    fn call_method(
        &self,
        name: &str,
        value: Value,
    ) -> impl Future<Output = Option<Result<(), BoxError>>> + Send;
}

/// Object-safe version of [`MethodProvider`].
pub trait DynMethodProvider: Send + Sync + 'static {
    /// Check whether a method named `name` is currently attached.
    fn has_method_dyn(&self, name: &str) -> bool;

    /// Invoke the method named `name` (dynamic dispatch version).
    fn call_method_dyn<'a>(
        &'a self,
        name: &'a str,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Option<Result<(), BoxError>>> + Send + 'a>>;
}

impl<P: MethodProvider> DynMethodProvider for P {
    fn has_method_dyn(&self, name: &str) -> bool {
        self.has_method(name)
    }

    fn call_method_dyn<'a>(
        &'a self,
        name: &'a str,
        value: Value,
    ) -> Pin<Box<dyn Future<Output = Option<Result<(), BoxError>>> + Send + 'a>> {
        Box::pin(self.call_method(name, value))
    }
}
