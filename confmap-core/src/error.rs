//! Error types for confmap.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`ConfigError`] - Errors raised while declaring or dispatching keys
//! - [`ErrorKind`] - Programmatic classification of a [`ConfigError`]
//! - [`ValueError`] - Errors from interpreting input values

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message used when the callable declaration form receives an unusable argument.
pub const EXPECTED_KEY_MESSAGE: &str = "expected key to be a string or object";

/// Errors raised by a dispatcher.
///
/// `InvalidArgument` is returned synchronously from declaration calls. Every
/// other variant is produced while processing an input and is reported once
/// through the result of `process`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A declaration call received an argument it cannot interpret.
    #[error("{0}")]
    InvalidArgument(String),

    /// A key resolved to neither a registered action nor a target method.
    ///
    /// Only produced by strict dispatchers; lenient ones skip the key.
    #[error("no action resolves key `{key}`")]
    UnresolvedAction {
        /// The alias-resolved key.
        key: String,
    },

    /// Following the alias chain for `key` revisited a key.
    #[error("alias cycle detected for key `{key}`: {}", chain.join(" -> "))]
    AliasCycle {
        /// The key whose resolution was requested.
        key: String,
        /// Keys visited, ending with the first repeated key.
        chain: Vec<String>,
    },

    /// The action invoked for `key` reported a failure.
    #[error("action for key `{key}` failed: {source}")]
    ActionFailure {
        /// The key used to look up the action.
        key: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },

    /// The dispatcher's target was dropped before dispatch.
    #[error("dispatcher `{namespace}` is detached from its target")]
    Detached {
        /// Namespace of the detached dispatcher.
        namespace: String,
    },
}

/// Classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ConfigError::InvalidArgument`].
    InvalidArgument,
    /// See [`ConfigError::UnresolvedAction`].
    UnresolvedAction,
    /// See [`ConfigError::AliasCycle`].
    AliasCycle,
    /// See [`ConfigError::ActionFailure`].
    ActionFailure,
    /// See [`ConfigError::Detached`].
    Detached,
}

impl ConfigError {
    /// Create an `InvalidArgument` error with a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ConfigError::InvalidArgument(message.into())
    }

    /// Wrap an action failure for `key`.
    pub fn action_failure(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ConfigError::ActionFailure {
            key: key.into(),
            source: source.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ConfigError::UnresolvedAction { .. } => ErrorKind::UnresolvedAction,
            ConfigError::AliasCycle { .. } => ErrorKind::AliasCycle,
            ConfigError::ActionFailure { .. } => ErrorKind::ActionFailure,
            ConfigError::Detached { .. } => ErrorKind::Detached,
        }
    }

    /// The key the error originated from, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::UnresolvedAction { key }
            | ConfigError::AliasCycle { key, .. }
            | ConfigError::ActionFailure { key, .. } => Some(key),
            ConfigError::InvalidArgument(_) | ConfigError::Detached { .. } => None,
        }
    }
}

/// Errors from interpreting an input value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A key list was expected.
    #[error("expected a key or list of keys, got {found}")]
    ExpectedKeyList {
        /// JSON type name of the value found.
        found: &'static str,
    },

    /// An object was expected.
    #[error("expected an object, got {found}")]
    ExpectedObject {
        /// JSON type name of the value found.
        found: &'static str,
    },

    /// A string was expected.
    #[error("expected a string, got {found}")]
    ExpectedString {
        /// JSON type name of the value found.
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = ConfigError::invalid_argument(EXPECTED_KEY_MESSAGE);
        assert_eq!(err.to_string(), "expected key to be a string or object");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.key(), None);
    }

    #[test]
    fn test_alias_cycle_display() {
        let err = ConfigError::AliasCycle {
            key: "a".into(),
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "alias cycle detected for key `a`: a -> b -> a");
        assert_eq!(err.key(), Some("a"));
    }

    #[test]
    fn test_action_failure_keeps_source() {
        let err = ConfigError::action_failure("use", "plugin missing");
        assert_eq!(err.kind(), ErrorKind::ActionFailure);
        assert_eq!(err.key(), Some("use"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("plugin missing"));
    }
}
