//! # confmap-core
//!
//! Core traits for the confmap key-to-action dispatcher.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugins and collaborators that don't need the full `confmap-std`
//! implementation.
//!
//! # Building Blocks
//!
//! ## Handlers ([`Handler`])
//!
//! Explicitly supplied callables bound to a key. They receive the lookup key
//! and the original value.
//!
//! ## Methods ([`Method`], [`MethodProvider`])
//!
//! Named capabilities of a dispatch target. A dispatcher resolves method
//! names against its provider at dispatch time, never at declaration time.
//!
//! ## Notifications ([`Notification`])
//!
//! Observable effects announced by targets as actions run.
//!
//! # Error Types
//!
//! - [`ConfigError`] - Declaration and dispatch errors, classified by [`ErrorKind`]
//! - [`ValueError`] - Input values of the wrong shape

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod handler;
mod method;
mod notification;
mod value;

// Re-exports
pub use error::{BoxError, ConfigError, EXPECTED_KEY_MESSAGE, ErrorKind, ValueError};
pub use handler::{DynHandler, Handler};
pub use method::{DynMethod, DynMethodProvider, FnMethod, Method, MethodProvider};
pub use notification::Notification;
pub use value::{Input, as_object, as_str, key_list, type_name};

pub use serde_json::Value;
