//! In-process publish/subscribe bus for cross-screen notifications.
//!
//! The aggregator is constructed once at startup and shared by reference
//! (`Arc`) with every component that publishes or listens. A subscription
//! only sees events published after it was created.

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use crate::model::MovieId;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// Notifications broadcast between screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The listing changed; list screens should refresh.
    RefreshList,
    /// A listing page was written to the cache.
    PageCached {
        /// Page number.
        page: u32,
    },
    /// A film's details were written to the cache.
    InfoCached {
        /// Film ID.
        id: MovieId,
    },
}

/// Endless stream of events for one subscriber.
pub type EventStream = BoxStream<'static, AppEvent>;

/// Fan-out event bus.
///
/// Each subscriber receives events in publish order. A subscriber that
/// falls more than the channel capacity behind skips the oldest events.
#[derive(Debug, Clone)]
pub struct EventAggregator {
    sender: broadcast::Sender<AppEvent>,
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventAggregator {
    /// Create a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Deliver `event` to every current subscriber.
    pub fn publish(&self, event: AppEvent) {
        let receivers = self.sender.receiver_count();
        debug!(?event, receivers, "Publishing event");
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
            .filter_map(|event| async move {
                match event {
                    Ok(event) => Some(event),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event subscriber lagged, events dropped");
                        None
                    }
                }
            })
            .boxed()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers_in_order() {
        let bus = EventAggregator::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(AppEvent::PageCached { page: 1 });
        bus.publish(AppEvent::RefreshList);

        for stream in [&mut first, &mut second] {
            assert_eq!(stream.next().await, Some(AppEvent::PageCached { page: 1 }));
            assert_eq!(stream.next().await, Some(AppEvent::RefreshList));
        }
    }

    #[test]
    fn test_no_replay_for_late_subscriber() {
        let bus = EventAggregator::default();
        bus.publish(AppEvent::RefreshList);

        let mut late = bus.subscribe();
        let mut next = task::spawn(late.next());
        assert_pending!(next.poll());

        bus.publish(AppEvent::InfoCached { id: MovieId(7) });
        assert!(next.is_woken());
        assert_ready_eq!(next.poll(), Some(AppEvent::InfoCached { id: MovieId(7) }));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = EventAggregator::new(0);
        bus.publish(AppEvent::RefreshList);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_oldest() {
        let bus = EventAggregator::new(2);
        let mut stream = bus.subscribe();

        for page in 1..=4 {
            bus.publish(AppEvent::PageCached { page });
        }

        assert_eq!(stream.next().await, Some(AppEvent::PageCached { page: 3 }));
        assert_eq!(stream.next().await, Some(AppEvent::PageCached { page: 4 }));
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_released() {
        let bus = EventAggregator::default();
        let stream = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(stream);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
