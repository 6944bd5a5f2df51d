//! # Delivery events emitted by the engine.
//!
//! The [`EventKind`] enum classifies the three observable outcomes:
//! - **Received**: an inbound payload was decoded (emitted whether or not
//!   it was rendered)
//! - **Tapped**: the user selected a displayed notification
//! - **Added**: one `push` call finished its fan-out (best-effort
//!   dispatched signal, not a per-target success guarantee)
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore order when events are observed from
//! independent receivers.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::message::Message;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of delivery events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An inbound payload was decoded into a message.
    ///
    /// Emitted exactly once per successfully decoded payload, independent
    /// of the render decision.
    Received,

    /// The user tapped a displayed notification.
    Tapped,

    /// A `push` call completed its fan-out.
    ///
    /// Emitted exactly once per `push`, after every target reached a
    /// terminal state, regardless of how many targets succeeded.
    Added,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::Received => "received",
            EventKind::Tapped => "tapped",
            EventKind::Added => "added",
        }
    }
}

/// Delivery event with an optional message payload.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `message`: the message the event describes, when applicable
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// The message this event describes.
    pub message: Option<Message>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            message: None,
        }
    }

    /// Attaches a message.
    #[inline]
    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    /// Creates a `Received` event carrying the decoded message.
    #[inline]
    pub fn received(message: Message) -> Self {
        Event::new(EventKind::Received).with_message(message)
    }

    /// Creates a `Tapped` event carrying the selected message.
    #[inline]
    pub fn tapped(message: Message) -> Self {
        Event::new(EventKind::Tapped).with_message(message)
    }

    /// Creates an `Added` event carrying the dispatched message.
    #[inline]
    pub fn added(message: Message) -> Self {
        Event::new(EventKind::Added).with_message(message)
    }

    #[inline]
    pub fn is_received(&self) -> bool {
        matches!(self.kind, EventKind::Received)
    }

    #[inline]
    pub fn is_tapped(&self) -> bool {
        matches!(self.kind, EventKind::Tapped)
    }

    #[inline]
    pub fn is_added(&self) -> bool {
        matches!(self.kind, EventKind::Added)
    }
}
