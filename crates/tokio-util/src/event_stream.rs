//! Event streams related functionality.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt,
    pin::Pin,
    sync::Weak,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// The set of live subscribers of an [`EventSender`](crate::EventSender).
pub(crate) struct Subscribers<T> {
    next_id: u64,
    senders: HashMap<u64, mpsc::Sender<T>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self { next_id: 0, senders: HashMap::new() }
    }
}

impl<T> Subscribers<T> {
    pub(crate) fn insert(&mut self, sender: mpsc::Sender<T>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.senders.insert(id, sender);
        id
    }

    pub(crate) fn remove(&mut self, id: u64) {
        self.senders.remove(&id);
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&u64, &mut mpsc::Sender<T>) -> bool) {
        self.senders.retain(f);
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// A subscription to an [`EventSender`](crate::EventSender).
///
/// Events arrive in publication order. Dropping the stream, or calling
/// [`unsubscribe`](Self::unsubscribe), removes the subscription. The stream ends once every
/// sender is gone and the buffered events have been read.
pub struct EventStream<T> {
    id: u64,
    receiver: mpsc::Receiver<T>,
    subscribers: Weak<Mutex<Subscribers<T>>>,
}

impl<T> EventStream<T> {
    pub(crate) fn new(
        id: u64,
        receiver: mpsc::Receiver<T>,
        subscribers: Weak<Mutex<Subscribers<T>>>,
    ) -> Self {
        Self { id, receiver, subscribers }
    }

    /// Receives the next event, `None` once the publisher is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Cancels the subscription.
    pub fn unsubscribe(self) {}
}

impl<T> Stream for EventStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl<T> Drop for EventStream<T> {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.lock().remove(self.id);
        }
    }
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream").field("id", &self.id).finish_non_exhaustive()
    }
}
