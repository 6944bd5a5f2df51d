//! # Push-messaging transport seam.
//!
//! The engine drives all network delivery through [`Transport`]. A real
//! implementation wraps the provider SDK; tests substitute recording stubs.
//!
//! ## Rules
//! - `send` covers **one attempt** to **one target**; the retry loop lives
//!   in the engine, not here.
//! - Failures carry a [`TransportErrorKind`](crate::TransportErrorKind)
//!   classification used only for logging — the engine retries every kind
//!   identically.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::TransportError;

/// # Asynchronous push transport.
///
/// Targets are opaque wire ids: a device registration token, or a topic
/// name carrying the engine's `/topics/` prefix.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Attempts to deliver one notification to one target.
    async fn send(
        &self,
        target: &str,
        title: Option<&str>,
        body: Option<&str>,
        data: &Map<String, Value>,
    ) -> Result<(), TransportError>;

    /// Subscribes this installation to a topic.
    async fn subscribe_topic(&self, topic: &str) -> Result<(), TransportError>;

    /// Unsubscribes this installation from a topic.
    async fn unsubscribe_topic(&self, topic: &str) -> Result<(), TransportError>;

    /// Returns the current registration token, if one has been issued.
    async fn token(&self) -> Result<Option<String>, TransportError>;
}
