//! # Event bus for broadcasting delivery events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that adds
//! close-once teardown semantics.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and never waits on
//!   slow subscribers; each receiver observes independently.
//! - **No buffering guarantee**: an event published with no active
//!   subscribers is dropped; late subscribers miss past events.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip
//!   `n` oldest items.
//! - **Close-once**: the bus is closed exactly once during teardown;
//!   further `close()` calls are no-ops and publish-after-close silently
//!   drops the event instead of erroring.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for delivery events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (Arc-backed sender and close flag).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    closed: Arc<AtomicBool>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// ### Notes
    /// - Capacity is shared across all receivers (not per-subscriber).
    /// - The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// - If there are no receivers, the event is dropped.
    /// - After [`Bus::close`], publishing is a silent no-op, never an error.
    pub fn publish(&self, ev: Event) {
        if self.closed.load(AtomicOrdering::Acquire) {
            tracing::trace!(kind = ev.kind.as_label(), "event dropped: bus closed");
            return;
        }
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets events sent **after** it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Closes the bus. Idempotent; only the first call has an effect.
    pub fn close(&self) {
        if !self.closed.swap(true, AtomicOrdering::AcqRel) {
            tracing::debug!("event bus closed");
        }
    }

    /// Whether [`Bus::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::message::Message;

    fn msg() -> Message {
        Message::builder()
            .title("T")
            .recipient("dev1")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let bus = Bus::new(8);
        bus.publish(Event::added(msg()));

        // A late subscriber must not observe the past event.
        let mut rx = bus.subscribe();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_every_subscriber_observes_independently() {
        let bus = Bus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(Event::added(msg()));

        assert_eq!(a.recv().await.unwrap().kind, EventKind::Added);
        assert_eq!(b.recv().await.unwrap().kind, EventKind::Added);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_publish_after_close_is_noop() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.close();
        bus.close();
        assert!(bus.is_closed());

        bus.publish(Event::added(msg()));
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_subscribe_during_publish_is_safe() {
        let bus = Bus::new(64);
        let publisher = {
            let bus = bus.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    bus.publish(Event::added(msg()));
                    tokio::task::yield_now().await;
                }
            })
        };
        // Subscribing while the publisher runs must not panic or deadlock.
        for _ in 0..10 {
            let _rx = bus.subscribe();
            tokio::task::yield_now().await;
        }
        publisher.await.unwrap();
    }
}
