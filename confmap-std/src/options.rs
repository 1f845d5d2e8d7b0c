//! Dispatcher configuration.

/// What a dispatcher does with the remaining keys after one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep dispatching the remaining keys; report only the first error (default).
    #[default]
    Continue,
    /// Return the first error immediately.
    Stop,
}

/// Options for a [`Dispatcher`](crate::Dispatcher).
///
/// # Example
/// ```ignore
/// let options = DispatchOptions::new().strict().stop_on_failure();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOptions {
    /// Fail keys that resolve to no action instead of skipping them.
    pub strict: bool,
    /// Continuation policy after a failed key.
    pub on_failure: FailurePolicy,
}

impl DispatchOptions {
    /// Create the default options: lenient, continue on failure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report unresolved keys as errors.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Stop at the first failed key.
    pub fn stop_on_failure(mut self) -> Self {
        self.on_failure = FailurePolicy::Stop;
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}
