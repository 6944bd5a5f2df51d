//! # Message: immutable notification value object.
//!
//! One [`Message`] describes a single notification occurrence: identity,
//! content, targets, display hints, timestamps and seen-state. Messages are
//! never mutated in place; updates produce a new value via field-wise copy.
//!
//! ## Construction invariants
//! - **Target**: at least one of {non-empty `recipients`, `topic`} must be
//!   present. Carrying both simultaneously is valid; a set topic is the
//!   single logical dispatch target.
//! - **Content**: at least one of {`title`, `body`} must be present.
//!
//! Violations fail `build()` with
//! [`NotifyError::InvalidMessage`](crate::NotifyError::InvalidMessage).
//!
//! ## Identity
//! - `id` is an opaque unique string, uuid v4 when not supplied.
//! - `notification_id` is the 32-bit tray handle, derived deterministically
//!   from `id` (FNV-1a, masked non-negative) when not supplied — stable
//!   across retries of the same logical message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::channel::Importance;
use crate::error::NotifyError;

/// Delivery schedule: a future timestamp plus an optional IANA timezone
/// name for the platform scheduler.
///
/// Presence on a message switches delivery from "show now" to "schedule".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// When to deliver.
    pub at: DateTime<Utc>,
    /// Timezone the platform scheduler should interpret `at` in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Immutable value object describing one notification occurrence.
///
/// Built with [`Message::builder`] (outbound) or decoded from a transport
/// payload by [`codec::decode`](crate::message::codec::decode) (inbound).
/// Serialization uses camelCase field names; this is also the persisted
/// history layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: String,
    notification_id: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    recipients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    importance: Option<Importance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    play_sound: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schedule_at: Option<Schedule>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    seen: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    payload: Map<String, Value>,
}

impl Message {
    /// Starts building an outbound message.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Opaque unique identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 32-bit platform tray handle; non-negative, stable for this `id`.
    pub fn notification_id(&self) -> i32 {
        self.notification_id
    }

    /// Ordered per-device target strings; may be empty.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Topic name, if any.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Channel name; `None` falls back to the default channel.
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Notification title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Notification body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Per-message importance override.
    pub fn importance(&self) -> Option<Importance> {
        self.importance
    }

    /// Per-message sound override.
    pub fn play_sound(&self) -> Option<bool> {
        self.play_sound
    }

    /// Delivery schedule; `None` means "show now".
    pub fn schedule_at(&self) -> Option<&Schedule> {
        self.schedule_at.as_ref()
    }

    /// Construction timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Seen-state; mutated only by the history collaborator, never by the
    /// dispatch engine.
    pub fn seen(&self) -> bool {
        self.seen
    }

    /// Opaque key/value payload, passed through unmodified.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Whether the target invariant holds for this message.
    pub fn has_target(&self) -> bool {
        !self.recipients.is_empty() || self.topic.is_some()
    }

    /// Returns a copy of this message with the given seen-state.
    ///
    /// Field-wise copy; every other field is preserved.
    #[must_use]
    pub fn with_seen(&self, seen: bool) -> Self {
        Self {
            seen,
            ..self.clone()
        }
    }

    /// Assembles a decoded inbound message. Content invariant is the
    /// caller's (codec's) responsibility; target fields stay empty because
    /// the payload already arrived at this device.
    pub(crate) fn from_wire(
        id: Option<String>,
        notification_id: Option<i32>,
        title: Option<String>,
        body: Option<String>,
        channel: Option<String>,
        importance: Option<Importance>,
        play_sound: Option<bool>,
        schedule_at: Option<Schedule>,
        payload: Map<String, Value>,
    ) -> Self {
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let notification_id = notification_id.unwrap_or_else(|| derive_notification_id(&id));
        Self {
            id,
            notification_id,
            recipients: Vec::new(),
            topic: None,
            channel,
            title,
            body,
            importance,
            play_sound,
            schedule_at,
            created_at: Utc::now(),
            seen: false,
            payload,
        }
    }
}

/// Builder for outbound [`Message`]s; `build()` enforces the construction
/// invariants.
///
/// ## Example
/// ```
/// use notifly::Message;
///
/// let msg = Message::builder()
///     .title("Build finished")
///     .body("All 412 tests passed")
///     .channel("ci")
///     .recipient("device-token-1")
///     .build()
///     .unwrap();
///
/// assert_eq!(msg.recipients().len(), 1);
/// assert!(msg.notification_id() >= 0);
/// ```
#[derive(Debug, Default)]
pub struct MessageBuilder {
    id: Option<String>,
    notification_id: Option<i32>,
    recipients: Vec<String>,
    topic: Option<String>,
    channel: Option<String>,
    title: Option<String>,
    body: Option<String>,
    importance: Option<Importance>,
    play_sound: Option<bool>,
    schedule_at: Option<Schedule>,
    payload: Map<String, Value>,
}

impl MessageBuilder {
    /// Sets an explicit identity (generated when absent).
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets an explicit tray handle (derived from `id` when absent).
    pub fn notification_id(mut self, id: i32) -> Self {
        self.notification_id = Some(id);
        self
    }

    /// Appends one recipient device target.
    pub fn recipient(mut self, target: impl Into<String>) -> Self {
        self.recipients.push(target.into());
        self
    }

    /// Appends multiple recipient device targets, preserving order.
    pub fn recipients<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients.extend(targets.into_iter().map(Into::into));
        self
    }

    /// Sets the topic target.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Selects a channel by name.
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Overrides the resolved channel importance for this message.
    pub fn importance(mut self, importance: Importance) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Overrides the resolved sound flag for this message.
    pub fn play_sound(mut self, play_sound: bool) -> Self {
        self.play_sound = Some(play_sound);
        self
    }

    /// Schedules delivery instead of showing immediately.
    pub fn schedule_at(mut self, at: DateTime<Utc>, timezone: Option<String>) -> Self {
        self.schedule_at = Some(Schedule { at, timezone });
        self
    }

    /// Inserts one payload entry.
    pub fn payload_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Replaces the whole payload map.
    pub fn payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Validates the invariants and produces the immutable message.
    ///
    /// ### Errors
    /// - [`NotifyError::InvalidMessage`] when both `recipients` is empty and
    ///   `topic` is absent (nothing to dispatch to).
    /// - [`NotifyError::InvalidMessage`] when both `title` and `body` are
    ///   absent (nothing to display).
    pub fn build(self) -> Result<Message, NotifyError> {
        if self.recipients.is_empty() && self.topic.is_none() {
            return Err(NotifyError::InvalidMessage {
                reason: "message has no recipients and no topic".into(),
            });
        }
        if self.title.is_none() && self.body.is_none() {
            return Err(NotifyError::InvalidMessage {
                reason: "message has neither title nor body".into(),
            });
        }

        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let notification_id = self
            .notification_id
            .unwrap_or_else(|| derive_notification_id(&id));

        Ok(Message {
            id,
            notification_id,
            recipients: self.recipients,
            topic: self.topic,
            channel: self.channel,
            title: self.title,
            body: self.body,
            importance: self.importance,
            play_sound: self.play_sound,
            schedule_at: self.schedule_at,
            created_at: Utc::now(),
            seen: false,
            payload: self.payload,
        })
    }
}

/// Derives the 32-bit tray handle from a message id.
///
/// FNV-1a over the id bytes, masked to the non-negative range the platform
/// tray accepts. Deterministic: the same id always yields the same handle.
pub(crate) fn derive_notification_id(id: &str) -> i32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET;
    for byte in id.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash & 0x7fff_ffff) as i32
}
