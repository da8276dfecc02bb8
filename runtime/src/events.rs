//! Single-delivery event channel.
//!
//! Screens publish two kinds of output: the current UI state, which every
//! observer can read at any time, and one-shot events (navigate, show a
//! toast) that must be acted on exactly once. This module provides the
//! latter.
//!
//! Events are queued until an observer takes them. Each event is handed to
//! exactly one [`EventReceiver`]; once taken it is gone, so an observer that
//! subscribes later never sees it.

use futures::Stream;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Queue of one-shot events with at-most-once delivery.
#[derive(Debug)]
pub struct EventChannel<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
}

impl<T> EventChannel<T> {
    /// Create an empty channel
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Queue an event for delivery to one observer
    pub fn emit(&self, event: T) {
        // The channel owns a receiver, so the queue stays open while `self` lives.
        if self.tx.send(event).is_err() {
            tracing::warn!("Event dropped: channel closed");
        }
    }

    /// Attach an observer
    ///
    /// All receivers share one queue; each event goes to whichever receiver
    /// takes it first.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver<T> {
        EventReceiver {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of an [`EventChannel`].
#[derive(Debug)]
pub struct EventReceiver<T> {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
}

impl<T> Clone for EventReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> EventReceiver<T> {
    /// Wait for the next undelivered event
    ///
    /// Returns `None` once the owning channel is dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Take the next undelivered event without waiting
    ///
    /// Returns `None` if the queue is empty or another receiver is currently
    /// waiting on it.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Take every event queued so far
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Convert into a stream of events
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold(self, |mut rx| async move {
            let event = rx.recv().await?;
            Some((event, rx))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn event_is_delivered_once() {
        let channel = EventChannel::new();
        let mut first = channel.subscribe();

        channel.emit("navigate");

        assert_eq!(first.recv().await, Some("navigate"));

        let mut late = channel.subscribe();
        assert_eq!(late.try_recv(), None);
        assert_eq!(first.try_recv(), None);
    }

    #[test]
    fn recv_wakes_when_event_arrives() {
        let channel = EventChannel::new();
        let mut observer = channel.subscribe();
        let mut next = tokio_test::task::spawn(async move { observer.recv().await });

        tokio_test::assert_pending!(next.poll());

        channel.emit("navigate");
        assert!(next.is_woken());
        tokio_test::assert_ready_eq!(next.poll(), Some("navigate"));
    }

    #[tokio::test]
    async fn queued_events_wait_for_first_observer() {
        let channel = EventChannel::new();
        channel.emit(1);
        channel.emit(2);

        let mut observer = channel.subscribe();
        assert_eq!(observer.drain(), vec![1, 2]);
    }

    #[tokio::test]
    async fn competing_observers_split_events() {
        let channel = EventChannel::new();
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();

        channel.emit(1);
        channel.emit(2);

        let from_a = a.try_recv();
        let from_b = b.try_recv();
        assert_eq!(from_a, Some(1));
        assert_eq!(from_b, Some(2));
        assert!(a.drain().is_empty());
    }

    #[tokio::test]
    async fn stream_ends_when_channel_dropped() {
        let channel = EventChannel::new();
        let observer = channel.subscribe();
        channel.emit("toast");
        drop(channel);

        let events: Vec<_> = observer.into_stream().collect().await;
        assert_eq!(events, vec!["toast"]);
    }
}
