//! # Platform notification tray seam.
//!
//! The engine drives all local display through [`Renderer`]. A real
//! implementation wraps the platform tray API; tests substitute recording
//! stubs.
//!
//! ## Rules
//! - Render failures are logged by the engine and never retried.
//! - `create_channel` receives the **effective** (fully resolved) channel;
//!   the renderer never performs inheritance itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::channel::EffectiveChannel;
use crate::error::RenderError;

/// # Asynchronous platform tray renderer.
#[async_trait]
pub trait Renderer: Send + Sync + 'static {
    /// Asks the platform for notification permission.
    ///
    /// `Ok(false)` means the user (or platform policy) declined.
    async fn request_permission(&self) -> Result<bool, RenderError>;

    /// Registers one channel with the platform tray.
    ///
    /// Called during `init()` for the default channel and every named
    /// channel; a failure is fatal to initialization.
    async fn create_channel(&self, channel: &EffectiveChannel) -> Result<(), RenderError>;

    /// Shows a notification now.
    async fn show(
        &self,
        notification_id: i32,
        title: Option<&str>,
        body: Option<&str>,
        channel: &EffectiveChannel,
        payload: &Map<String, Value>,
    ) -> Result<(), RenderError>;

    /// Schedules a notification for a future timestamp.
    ///
    /// `timezone` is the IANA zone name the platform scheduler should
    /// interpret `at` in; `None` means device-local time.
    #[allow(clippy::too_many_arguments)]
    async fn schedule(
        &self,
        notification_id: i32,
        title: Option<&str>,
        body: Option<&str>,
        channel: &EffectiveChannel,
        payload: &Map<String, Value>,
        at: DateTime<Utc>,
        timezone: Option<&str>,
    ) -> Result<(), RenderError>;

    /// Removes one displayed or scheduled notification.
    async fn cancel(&self, notification_id: i32) -> Result<(), RenderError>;

    /// Removes every displayed and scheduled notification.
    async fn cancel_all(&self) -> Result<(), RenderError>;
}
