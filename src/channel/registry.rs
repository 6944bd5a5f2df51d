//! # Channel resolution: merging a named channel over the default.
//!
//! [`EffectiveChannel::resolve`] produces the fully populated display
//! attribute set for a channel name by substituting, for every nullable
//! field, the default channel's value when the matched channel's value is
//! `None`, and a hard-coded baseline when both are `None`.
//!
//! ## Precedence (per field)
//! ```text
//! message-level override  (importance, play_sound only)
//!   > channel-specific value
//!     > default-channel value
//!       > baseline (importance=Default, play_sound=true, show_badge=true,
//!                   enable_vibration=true, enable_lights=false)
//! ```
//!
//! ## Rules
//! - Resolution is **pure**: same `(channel name, Config)` in, identical
//!   output out. No caching, no side effects.
//! - Resolution **never fails**: an unmatched name falls back to the
//!   default channel silently. Never block delivery for a misconfigured
//!   channel name.

use serde::{Deserialize, Serialize};

use crate::channel::types::{Channel, Importance};
use crate::config::Config;
use crate::message::Message;

/// Baseline used when neither the matched nor the default channel sets a value.
const BASELINE_PLAY_SOUND: bool = true;
const BASELINE_SHOW_BADGE: bool = true;
const BASELINE_ENABLE_VIBRATION: bool = true;
const BASELINE_ENABLE_LIGHTS: bool = false;

/// Fully-resolved, non-null display attribute set for one channel.
///
/// Produced by [`EffectiveChannel::resolve`]; consumed by the renderer
/// collaborator and attached to outbound wire payloads so the receiving
/// device renders with the same attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveChannel {
    /// Id of the matched channel (the default channel's id on fallback).
    pub id: String,
    /// Name of the matched channel.
    pub name: String,
    /// Description of the matched channel, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resolved importance.
    pub importance: Importance,
    /// Resolved sound flag.
    pub play_sound: bool,
    /// Resolved badge flag.
    pub show_badge: bool,
    /// Resolved vibration flag.
    pub enable_vibration: bool,
    /// Resolved LED flag.
    pub enable_lights: bool,
    /// LED color (ARGB); stays optional, there is no baseline color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_color: Option<u32>,
    /// Custom sound resource; stays optional, `None` means platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

impl EffectiveChannel {
    /// Resolves the effective display attributes for `channel` against the
    /// given config snapshot.
    ///
    /// - `None` or an unmatched name resolves the default channel.
    /// - The lookup key is [`Channel::id`]; first registered match wins.
    ///
    /// ### Rules
    /// - Pure and idempotent: resolving the same `(name, config)` twice
    ///   yields field-for-field identical results.
    /// - Never fails; there is no error path here by design.
    pub fn resolve(config: &Config, channel: Option<&str>) -> Self {
        let default = &config.default_channel;
        let matched = channel
            .and_then(|name| config.channels.iter().find(|c| c.id == name))
            .unwrap_or(default);

        Self::merge(matched, default)
    }

    /// Resolves `message.channel()` and applies the message-level
    /// `importance`/`play_sound` overrides on top.
    pub fn for_message(config: &Config, message: &Message) -> Self {
        Self::resolve(config, message.channel()).with_message_overrides(message)
    }

    /// Applies message-level overrides (highest precedence).
    ///
    /// Only `importance` and `play_sound` exist at the message level; all
    /// other attributes keep their resolved values.
    pub fn with_message_overrides(mut self, message: &Message) -> Self {
        if let Some(importance) = message.importance() {
            self.importance = importance;
        }
        if let Some(play_sound) = message.play_sound() {
            self.play_sound = play_sound;
        }
        self
    }

    /// Field-wise merge: matched value, else default value, else baseline.
    fn merge(matched: &Channel, default: &Channel) -> Self {
        Self {
            id: matched.id.clone(),
            name: matched.name.clone(),
            description: matched.description.clone(),
            importance: matched
                .importance
                .or(default.importance)
                .unwrap_or(Importance::Default),
            play_sound: matched
                .play_sound
                .or(default.play_sound)
                .unwrap_or(BASELINE_PLAY_SOUND),
            show_badge: matched
                .show_badge
                .or(default.show_badge)
                .unwrap_or(BASELINE_SHOW_BADGE),
            enable_vibration: matched
                .enable_vibration
                .or(default.enable_vibration)
                .unwrap_or(BASELINE_ENABLE_VIBRATION),
            enable_lights: matched
                .enable_lights
                .or(default.enable_lights)
                .unwrap_or(BASELINE_ENABLE_LIGHTS),
            led_color: matched.led_color.or(default.led_color),
            sound: matched.sound.clone().or_else(|| default.sound.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn config_with(channels: Vec<Channel>) -> Config {
        let mut cfg = Config::default();
        cfg.channels = channels;
        cfg
    }

    #[test]
    fn test_unknown_name_falls_back_to_default_without_error() {
        let cfg = Config::default();
        let eff = EffectiveChannel::resolve(&cfg, Some("does-not-exist"));
        assert_eq!(eff.id, cfg.default_channel.id);
        assert_eq!(eff.importance, Importance::Default);
    }

    #[test]
    fn test_none_name_resolves_default() {
        let cfg = Config::default();
        let eff = EffectiveChannel::resolve(&cfg, None);
        assert_eq!(eff.id, cfg.default_channel.id);
    }

    #[test]
    fn test_null_field_inherits_from_default() {
        let mut default = Channel::new("default", "Default");
        default.play_sound = Some(true);
        let promo = Channel::new("promo", "Promotions");

        let mut cfg = config_with(vec![promo]);
        cfg.default_channel = default;

        let eff = EffectiveChannel::resolve(&cfg, Some("promo"));
        assert!(eff.play_sound, "null play_sound must inherit default's true");
    }

    #[test]
    fn test_explicit_false_beats_default_true() {
        let mut default = Channel::new("default", "Default");
        default.play_sound = Some(true);
        let mut silent = Channel::new("silent", "Silent");
        silent.play_sound = Some(false);

        let mut cfg = config_with(vec![silent]);
        cfg.default_channel = default;

        let eff = EffectiveChannel::resolve(&cfg, Some("silent"));
        assert!(
            !eff.play_sound,
            "explicit false must win regardless of the default"
        );
    }

    #[test]
    fn test_baseline_when_both_are_null() {
        let cfg = config_with(vec![Channel::new("bare", "Bare")]);
        let eff = EffectiveChannel::resolve(&cfg, Some("bare"));

        assert_eq!(eff.importance, Importance::Default);
        assert!(eff.play_sound);
        assert!(eff.show_badge);
        assert!(eff.enable_vibration);
        assert!(!eff.enable_lights);
        assert!(eff.led_color.is_none());
        assert!(eff.sound.is_none());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut promo = Channel::new("promo", "Promotions");
        promo.importance = Some(Importance::High);
        promo.enable_lights = Some(true);
        promo.led_color = Some(0xFF00_FF00);
        let cfg = config_with(vec![promo]);

        let first = EffectiveChannel::resolve(&cfg, Some("promo"));
        let second = EffectiveChannel::resolve(&cfg, Some("promo"));
        assert_eq!(first, second, "same (name, config) must resolve identically");
    }

    #[test]
    fn test_message_overrides_beat_channel_values() {
        let mut promo = Channel::new("promo", "Promotions");
        promo.importance = Some(Importance::Low);
        promo.play_sound = Some(false);
        let cfg = config_with(vec![promo]);

        let msg = Message::builder()
            .title("T")
            .recipient("dev1")
            .channel("promo")
            .importance(Importance::Max)
            .play_sound(true)
            .build()
            .unwrap();

        let eff = EffectiveChannel::for_message(&cfg, &msg);
        assert_eq!(eff.importance, Importance::Max);
        assert!(eff.play_sound);
        // Non-overridable fields keep their resolved values.
        assert_eq!(eff.id, "promo");
    }

    #[test]
    fn test_message_without_overrides_keeps_resolved_values() {
        let mut promo = Channel::new("promo", "Promotions");
        promo.importance = Some(Importance::High);
        let cfg = config_with(vec![promo]);

        let msg = Message::builder()
            .title("T")
            .recipient("dev1")
            .channel("promo")
            .build()
            .unwrap();

        let eff = EffectiveChannel::for_message(&cfg, &msg);
        assert_eq!(eff.importance, Importance::High);
    }
}
