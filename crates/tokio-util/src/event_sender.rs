use crate::{event_stream::Subscribers, EventStream};
use parking_lot::Mutex;
use pocc_tracing::LogThrottle;
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

const DEFAULT_SUBSCRIBER_BUFFER: usize = 2000;

/// Publishes events to every registered [`EventStream`].
///
/// Delivery never waits on a subscriber: each one has its own buffer of `buffer` events. When a
/// buffer is full the event is dropped for that subscriber only.
pub struct EventSender<T> {
    subscribers: Arc<Mutex<Subscribers<T>>>,
    buffer: usize,
    lag_warning: Arc<LogThrottle>,
}

impl<T> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
            buffer: self.buffer,
            lag_warning: Arc::clone(&self.lag_warning),
        }
    }
}

impl<T> fmt::Debug for EventSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("subscribers", &self.subscribers.lock().len())
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl<T> Default for EventSender<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl<T: Clone + Send + 'static> EventSender<T> {
    /// Creates a new `EventSender` whose subscribers buffer up to `buffer` events each.
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
            buffer: buffer.max(1),
            lag_warning: Arc::new(LogThrottle::new(Duration::from_secs(1))),
        }
    }

    /// Sends the event to all subscribers and returns how many accepted it.
    ///
    /// Subscribers whose stream was dropped are removed.
    pub fn notify(&self, event: T) -> usize {
        let mut subscribers = self.subscribers.lock();
        if subscribers.is_empty() {
            trace!(target: "pocc::events", "no receivers for events");
            return 0
        }

        let mut delivered = 0;
        subscribers.retain(|id, sender| match sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                if let Some(suppressed) = self.lag_warning.permit() {
                    warn!(
                        target: "pocc::events",
                        subscriber = id,
                        suppressed,
                        "subscriber lagging, event dropped"
                    );
                }
                true
            }
            Err(TrySendError::Closed(_)) => {
                trace!(target: "pocc::events", subscriber = id, "subscriber gone");
                false
            }
        });
        delivered
    }

    /// Registers a new subscriber and returns its stream.
    pub fn new_listener(&self) -> EventStream<T> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let id = self.subscribers.lock().insert(sender);
        EventStream::new(id, receiver, Arc::downgrade(&self.subscribers))
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn delivers_in_order_to_every_subscriber() {
        let sender = EventSender::new(16);
        let mut first = sender.new_listener();
        let mut second = sender.new_listener();

        for i in 0..5u32 {
            assert_eq!(sender.notify(i), 2);
        }

        for i in 0..5u32 {
            assert_eq!(first.recv().await, Some(i));
        }
        let collected: Vec<_> = (&mut second).take(5).collect().await;
        assert_eq!(collected, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn slow_subscriber_does_not_block_others() {
        let sender = EventSender::new(2);
        let _stalled = sender.new_listener();
        let mut active = sender.new_listener();

        let publisher = {
            let sender = sender.clone();
            tokio::spawn(async move {
                for i in 0..10u32 {
                    sender.notify(i);
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut seen = Vec::new();
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(200), active.recv()).await
        {
            seen.push(event);
            if seen.len() == 10 {
                break
            }
        }
        publisher.await.unwrap();

        // the publisher finished although one subscriber never read anything
        assert_eq!(seen.first(), Some(&0));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(sender.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn unsubscribe_removes_subscriber() {
        let sender = EventSender::<u8>::new(4);
        let first = sender.new_listener();
        let second = sender.new_listener();
        assert_eq!(sender.subscriber_count(), 2);

        first.unsubscribe();
        assert_eq!(sender.subscriber_count(), 1);
        assert_eq!(sender.notify(1), 1);

        drop(second);
        assert_eq!(sender.subscriber_count(), 0);
        assert_eq!(sender.notify(2), 0);
    }

    #[tokio::test]
    async fn stream_ends_when_publisher_is_gone() {
        let sender = EventSender::<u8>::new(4);
        let mut stream = sender.new_listener();
        sender.notify(7);
        drop(sender);

        assert_eq!(stream.recv().await, Some(7));
        assert_eq!(stream.recv().await, None);
    }
}
