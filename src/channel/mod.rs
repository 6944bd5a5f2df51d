//! Notification channels: data model and resolution.
//!
//! This module groups the channel **data model** and the **registry**
//! that merges a named channel over the default channel into a fully
//! populated effective attribute set.
//!
//! ## Contents
//! - [`Channel`], [`ChannelGroup`], [`Importance`] channel attributes
//!   (nullable fields mean "inherit from the default channel")
//! - [`EffectiveChannel`] the merge result used by the renderer
//!
//! ## Quick reference
//! - Resolution reads the supplied [`Config`](crate::Config) snapshot on
//!   every call; nothing is cached.
//! - Unknown channel names silently fall back to the default channel —
//!   a misconfigured channel must never block delivery.

mod registry;
mod types;

pub use registry::EffectiveChannel;
pub use types::{Channel, ChannelGroup, Importance};
