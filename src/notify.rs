//! Delivery of [`Notification`]s to subscribers.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::types::Notification;

/// Fans notifications out to every live subscriber.
///
/// Sending never blocks and never reorders: each subscriber receives the
/// notifications in the order they were sent.  Subscribers whose receiver was
/// dropped are pruned on the next send.
#[derive(Clone, Default)]
pub struct Notifier {
    subscribers: Arc<Mutex<Vec<UnboundedSender<Notification>>>>,
}

impl Notifier {
    /// Creates a notifier without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Delivers `notification` to every subscriber.
    pub fn send(&self, notification: Notification) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(notification.clone()).is_ok());
    }

    /// The number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_order_to_all_subscribers() {
        let notifier = Notifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        notifier.send(Notification::WebsiteCount { count: 1 });
        notifier.send(Notification::WebsiteCount { count: 2 });
        for rx in [&mut a, &mut b] {
            assert_eq!(
                rx.try_recv().unwrap(),
                Notification::WebsiteCount { count: 1 }
            );
            assert_eq!(
                rx.try_recv().unwrap(),
                Notification::WebsiteCount { count: 2 }
            );
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let notifier = Notifier::new();
        let rx = notifier.subscribe();
        let _keep = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);
        drop(rx);
        notifier.send(Notification::WebsiteCount { count: 3 });
        assert_eq!(notifier.subscriber_count(), 1);
    }
}
