//! Broadcast notifier shared by a host and its stores.

use confmap_core::Notification;
use tokio::sync::broadcast;

/// Default number of notifications buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Fans notifications out to every subscriber.
///
/// Emitting never blocks and never fails: without subscribers the
/// notification is dropped, and a lagging subscriber loses the oldest ones.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    /// Create a notifier buffering up to `capacity` notifications.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a notification.
    pub fn emit(&self, notification: Notification) {
        #[cfg(feature = "tracing")]
        tracing::trace!(event = %notification.event, args = ?notification.args, "notify");
        let _ = self.sender.send(notification);
    }

    /// Subscribe to notifications emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Get the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
