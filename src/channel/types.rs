//! # Channel data model.
//!
//! A [`Channel`] bundles the display attributes a platform tray applies to
//! notifications posted through it. Every display flag is nullable: `None`
//! means "inherit from the default channel" and is filled in during
//! resolution (see [`EffectiveChannel`](crate::EffectiveChannel)).
//!
//! Exactly one channel per `id` may be registered; the default channel is
//! always implicitly part of the registry even when the configured channel
//! list omits it.

use serde::{Deserialize, Serialize};

/// Relative importance of notifications posted to a channel.
///
/// Mirrors the platform tray's importance ladder. The hard-coded baseline
/// used when neither the channel nor the default channel specifies a value
/// is [`Importance::Default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Do not show the notification at all.
    None,
    /// Minimal interruption; no sound, collapsed presentation.
    Min,
    /// Low interruption; shown without sound.
    Low,
    /// Standard presentation.
    #[default]
    Default,
    /// Elevated presentation; may peek.
    High,
    /// Maximum urgency; full-screen capable.
    Max,
}

/// A named notification channel.
///
/// `None` in any display field means the field inherits the default
/// channel's value during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Unique channel key; messages select a channel by this id.
    pub id: String,
    /// Optional owning group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Human-readable channel name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether notifications play a sound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_sound: Option<bool>,
    /// Whether notifications contribute to the launcher badge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_badge: Option<bool>,
    /// Whether notifications vibrate the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_vibration: Option<bool>,
    /// Whether notifications flash the notification LED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_lights: Option<bool>,
    /// LED color (ARGB), when lights are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_color: Option<u32>,
    /// Custom sound resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// Channel importance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
}

impl Channel {
    /// Creates a channel with the given id and name; every display flag
    /// starts as `None` (inherit).
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group_id: None,
            name: name.into(),
            description: None,
            play_sound: None,
            show_badge: None,
            enable_vibration: None,
            enable_lights: None,
            led_color: None,
            sound: None,
            importance: None,
        }
    }
}

/// A channel group: purely organizational, groups channels in the
/// platform's notification settings surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGroup {
    /// Unique group key.
    pub id: String,
    /// Human-readable group name.
    pub name: String,
}

impl ChannelGroup {
    /// Creates a channel group.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_channel_inherits_everything() {
        let ch = Channel::new("promo", "Promotions");
        assert_eq!(ch.id, "promo");
        assert!(ch.play_sound.is_none());
        assert!(ch.show_badge.is_none());
        assert!(ch.enable_vibration.is_none());
        assert!(ch.enable_lights.is_none());
        assert!(ch.importance.is_none());
    }

    #[test]
    fn test_importance_ordering() {
        assert!(Importance::Min < Importance::Default);
        assert!(Importance::Default < Importance::High);
        assert!(Importance::High < Importance::Max);
    }

    #[test]
    fn test_importance_serializes_lowercase() {
        let v = serde_json::to_value(Importance::High).unwrap();
        assert_eq!(v, serde_json::json!("high"));
    }
}
