//! # Process-wide delivery configuration.
//!
//! Provides [`Config`] centralized settings for the dispatch engine.
//!
//! Config is a single value, replaceable **as a whole** via
//! [`Dispatcher::replace_config`](crate::Dispatcher::replace_config) and
//! never partially mutated. Every engine operation snapshots its
//! `Arc<Config>` at entry, so a concurrent replacement can never produce
//! inconsistent reads mid-operation.
//!
//! ## Sentinel values
//! - `max_retries = 0` → exactly one attempt per target, no retry
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::channel::{Channel, ChannelGroup};
use crate::hooks::{Hooks, NoopHooks};

/// Transport credentials of the host application.
///
/// Opaque to the engine; handed to the transport collaborator verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Application id issued by the push provider.
    pub app_id: String,
    /// API key / server key.
    pub api_key: String,
    /// Optional provider project id.
    pub project_id: Option<String>,
}

/// Global configuration for the dispatch engine.
///
/// Defines:
/// - **Retry budget**: attempts per target and the constant delay between them
/// - **Channel registry**: default channel plus named overrides
/// - **Credentials**: opaque transport credentials
/// - **Hooks**: the application callback strategy
/// - **Event system**: bus capacity for event delivery
///
/// ## Field semantics
/// - `max_retries`: attempts **total** per target (`0` = one attempt, no retry)
/// - `retry_delay`: constant wait between consecutive attempts (reference
///   policy: 5 seconds, not exponential)
/// - `default_channel`: always part of the registry, even when `channels`
///   omits it
/// - `channels`: named overrides, resolved against `default_channel` on read
/// - `group_channels`: organizational channel groups
/// - `hooks`: application callbacks; [`NoopHooks`] when not installed
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
#[derive(Clone)]
pub struct Config {
    /// Attempts total per target; `0` means exactly one attempt.
    pub max_retries: u32,

    /// Constant delay between consecutive attempts for one target.
    pub retry_delay: Duration,

    /// The fallback channel every unmatched name resolves to.
    pub default_channel: Channel,

    /// Named channel overrides; one channel per id.
    pub channels: Vec<Channel>,

    /// Channel groups.
    pub group_channels: Vec<ChannelGroup>,

    /// Transport credentials.
    pub credentials: Credentials,

    /// Application callback strategy.
    pub hooks: Arc<dyn Hooks>,

    /// Capacity of the event bus broadcast ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the per-target attempt budget.
    ///
    /// `max_retries = 0` is the "single attempt" sentinel, so the budget is
    /// never zero.
    #[inline]
    pub fn attempts_per_target(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Iterates the full channel registry: the default channel first, then
    /// every named channel whose id differs from the default's.
    ///
    /// The default channel is implicitly registered even when `channels`
    /// repeats or omits it; duplicates of its id are skipped.
    pub fn registered_channels(&self) -> impl Iterator<Item = &Channel> {
        std::iter::once(&self.default_channel).chain(
            self.channels
                .iter()
                .filter(|c| c.id != self.default_channel.id),
        )
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_retries = 3` (three attempts per target)
    /// - `retry_delay = 5s` (constant)
    /// - `default_channel = Channel::new("default", "Default")`
    /// - empty channel list / groups / credentials
    /// - `hooks = NoopHooks` (silent, no user)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            default_channel: Channel::new("default", "Default"),
            channels: Vec::new(),
            group_channels: Vec::new(),
            credentials: Credentials::default(),
            hooks: Arc::new(NoopHooks),
            bus_capacity: 1024,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("default_channel", &self.default_channel.id)
            .field("channels", &self.channels.len())
            .field("group_channels", &self.group_channels.len())
            .field("hooks", &self.hooks.name())
            .field("bus_capacity", &self.bus_capacity)
            .finish()
    }
}
