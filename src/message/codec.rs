//! # Wire codec for the transport boundary.
//!
//! [`decode`] turns a raw transport payload into a [`Message`]; [`data_payload`]
//! builds the data map attached to outbound sends so the receiving device can
//! decode the same fields back.
//!
//! ## Rules
//! - Decode enforces the **content** invariant (title or body present); the
//!   target invariant does not apply inbound — the payload already arrived
//!   at this device, so the target fields stay empty.
//! - The opaque `payload` map passes through both directions unmodified.
//! - Decode failures are terminal for the affected payload only; the caller
//!   logs them and drops the single notification.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::channel::{EffectiveChannel, Importance};
use crate::error::DecodeError;
use crate::message::{Message, Schedule};

/// Wire shape of one notification payload. Everything is optional at the
/// parser level; invariants are checked after parsing so a missing field
/// yields a precise [`DecodeError::MissingField`] instead of a serde error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    id: Option<String>,
    notification_id: Option<i32>,
    title: Option<String>,
    body: Option<String>,
    channel: Option<String>,
    importance: Option<Importance>,
    play_sound: Option<bool>,
    schedule_at: Option<Schedule>,
    #[serde(default)]
    payload: Map<String, Value>,
}

/// Decodes a raw transport payload into a [`Message`].
///
/// ### Errors
/// - [`DecodeError::Malformed`] when the bytes are not valid wire JSON.
/// - [`DecodeError::MissingField`] when both `title` and `body` are absent.
pub fn decode(raw: &[u8]) -> Result<Message, DecodeError> {
    let wire: WireMessage = serde_json::from_slice(raw).map_err(|e| DecodeError::Malformed {
        detail: e.to_string(),
    })?;

    if wire.title.is_none() && wire.body.is_none() {
        return Err(DecodeError::MissingField {
            field: "title/body",
        });
    }

    Ok(Message::from_wire(
        wire.id,
        wire.notification_id,
        wire.title,
        wire.body,
        wire.channel,
        wire.importance,
        wire.play_sound,
        wire.schedule_at,
        wire.payload,
    ))
}

/// Builds the outbound data map for one transport send.
///
/// Carries the message identity, display hints resolved against `effective`
/// (so the receiving device renders with the sender's resolution), and the
/// caller's opaque payload under `payload`.
pub fn data_payload(message: &Message, effective: &EffectiveChannel) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("id".into(), Value::String(message.id().to_owned()));
    data.insert(
        "notificationId".into(),
        Value::from(message.notification_id()),
    );
    if let Some(title) = message.title() {
        data.insert("title".into(), Value::String(title.to_owned()));
    }
    if let Some(body) = message.body() {
        data.insert("body".into(), Value::String(body.to_owned()));
    }
    data.insert("channel".into(), Value::String(effective.id.clone()));
    // Resolved hints, post message-override: highest-precedence values win
    // on the receiving side too.
    if let Ok(importance) = serde_json::to_value(effective.importance) {
        data.insert("importance".into(), importance);
    }
    data.insert("playSound".into(), Value::Bool(effective.play_sound));
    if let Some(schedule) = message.schedule_at() {
        if let Ok(schedule) = serde_json::to_value(schedule) {
            data.insert("scheduleAt".into(), schedule);
        }
    }
    if !message.payload().is_empty() {
        data.insert("payload".into(), Value::Object(message.payload().clone()));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_decode_full_payload() {
        let raw = serde_json::to_vec(&serde_json::json!({
            "id": "msg-9",
            "title": "T",
            "body": "B",
            "channel": "promo",
            "importance": "high",
            "playSound": false,
            "payload": { "deepLink": "app://orders/9" }
        }))
        .unwrap();

        let msg = decode(&raw).unwrap();
        assert_eq!(msg.id(), "msg-9");
        assert_eq!(msg.title(), Some("T"));
        assert_eq!(msg.body(), Some("B"));
        assert_eq!(msg.channel(), Some("promo"));
        assert_eq!(msg.importance(), Some(Importance::High));
        assert_eq!(msg.play_sound(), Some(false));
        assert_eq!(
            msg.payload().get("deepLink"),
            Some(&serde_json::json!("app://orders/9"))
        );
        assert!(msg.recipients().is_empty());
        assert!(!msg.seen());
    }

    #[test]
    fn test_decode_missing_content_fails() {
        let raw = serde_json::to_vec(&serde_json::json!({ "id": "msg-9" })).unwrap();
        let err = decode(&raw).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "title/body" }));
    }

    #[test]
    fn test_decode_malformed_bytes_fail() {
        let err = decode(b"not json at all").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn test_decode_generates_identity_when_absent() {
        let raw = serde_json::to_vec(&serde_json::json!({ "title": "T" })).unwrap();
        let msg = decode(&raw).unwrap();
        assert!(!msg.id().is_empty());
        assert!(msg.notification_id() >= 0);
    }

    #[test]
    fn test_data_payload_carries_resolved_hints() {
        let cfg = Config::default();
        let msg = Message::builder()
            .id("msg-1")
            .title("T")
            .recipient("dev1")
            .importance(Importance::Max)
            .payload_entry("k", serde_json::json!("v"))
            .build()
            .unwrap();
        let effective = EffectiveChannel::for_message(&cfg, &msg);

        let data = data_payload(&msg, &effective);
        assert_eq!(data.get("id"), Some(&serde_json::json!("msg-1")));
        assert_eq!(data.get("importance"), Some(&serde_json::json!("max")));
        assert_eq!(data.get("playSound"), Some(&serde_json::json!(true)));
        assert_eq!(
            data.get("payload"),
            Some(&serde_json::json!({ "k": "v" }))
        );
    }

    #[test]
    fn test_data_payload_round_trips_through_decode() {
        let cfg = Config::default();
        let msg = Message::builder()
            .id("msg-7")
            .title("T")
            .body("B")
            .channel("promo")
            .recipient("dev1")
            .build()
            .unwrap();
        let effective = EffectiveChannel::for_message(&cfg, &msg);

        let raw = serde_json::to_vec(&data_payload(&msg, &effective)).unwrap();
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.id(), "msg-7");
        assert_eq!(decoded.notification_id(), msg.notification_id());
        assert_eq!(decoded.title(), Some("T"));
    }
}
