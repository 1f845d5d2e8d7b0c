//! Notifications announced by dispatch targets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An observable event emitted as the side effect of a dispatched action.
///
/// # Example
///
/// ```rust,ignore
/// let note = Notification::new("set", ["a".into(), "b".into()]);
/// assert_eq!(note.event, "set");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Name of the event, usually the method that produced it.
    pub event: String,
    /// Event arguments.
    pub args: Vec<Value>,
}

impl Notification {
    /// Create a notification from an event name and its arguments.
    pub fn new(event: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            event: event.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Check whether this notification carries the given event name.
    pub fn is(&self, event: &str) -> bool {
        self.event == event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_serializes() {
        let note = Notification::new("has", [json!("a"), json!(true)]);
        assert!(note.is("has"));
        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            json!({ "event": "has", "args": ["a", true] })
        );
    }
}
