//! Error types used by the notifly engine and its collaborators.
//!
//! This module defines the full taxonomy:
//!
//! - [`NotifyError`] — errors surfaced by the public dispatch API.
//! - [`TransportError`] — per-attempt send failure (retryable), with a
//!   [`TransportErrorKind`] classification used only for logging.
//! - [`DecodeError`] — malformed inbound payload, terminal for that payload.
//! - [`RenderError`] — platform display failure, logged and never retried.
//! - [`HistoryError`] — history-store failure; logged at every call site and
//!   never raised through the engine's public surface.
//!
//! All types provide `as_label()` for stable snake_case log/metric labels.

use thiserror::Error;

/// # Errors surfaced by the dispatch API.
///
/// Everything that can be raised to a caller of the engine lives here.
/// Failures inside the per-target retry loop are deliberately **not**
/// represented: they are absorbed after retries are exhausted and only
/// observable through logs.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Message construction or dispatch contract violation.
    #[error("invalid message: {reason}")]
    InvalidMessage {
        /// Which invariant was violated.
        reason: String,
    },

    /// A dispatch operation was called before `init()` completed.
    #[error("dispatcher is not initialized; call init() first")]
    NotInitialized,

    /// The platform denied a required notification permission.
    #[error("notification permission denied: {detail}")]
    PermissionDenied {
        /// Platform-provided detail, if any.
        detail: String,
    },

    /// Channel registration failed during `init()` (fatal to init).
    #[error("channel setup failed: {error}")]
    ChannelSetup {
        /// The underlying renderer error message.
        error: String,
    },

    /// A direct transport call failed (topic subscribe/unsubscribe, token).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An inbound payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The platform tray failed to display a notification.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl NotifyError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use notifly::NotifyError;
    ///
    /// let err = NotifyError::NotInitialized;
    /// assert_eq!(err.as_label(), "not_initialized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            NotifyError::InvalidMessage { .. } => "invalid_message",
            NotifyError::NotInitialized => "not_initialized",
            NotifyError::PermissionDenied { .. } => "permission_denied",
            NotifyError::ChannelSetup { .. } => "channel_setup",
            NotifyError::Transport(e) => e.as_label(),
            NotifyError::Decode(e) => e.as_label(),
            NotifyError::Render(_) => "render_failed",
        }
    }
}

/// Classification of a transport failure.
///
/// The classification exists for logging only: every kind retries
/// identically inside the delivery loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection could not be established.
    Connection,
    /// Establishing the connection timed out.
    ConnectTimeout,
    /// Sending the request timed out.
    SendTimeout,
    /// Waiting for the response timed out.
    ReceiveTimeout,
    /// Anything else.
    Unknown,
}

impl TransportErrorKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportErrorKind::Connection => "transport_connection",
            TransportErrorKind::ConnectTimeout => "transport_connect_timeout",
            TransportErrorKind::SendTimeout => "transport_send_timeout",
            TransportErrorKind::ReceiveTimeout => "transport_receive_timeout",
            TransportErrorKind::Unknown => "transport_unknown",
        }
    }
}

/// # Per-attempt send failure reported by the transport collaborator.
///
/// Carries a [`TransportErrorKind`] and a human-readable message. The kind
/// feeds log labels; the retry loop treats all kinds the same.
#[derive(Error, Debug, Clone)]
#[error("transport send failed: {message}")]
pub struct TransportError {
    /// Failure classification (logging only).
    pub kind: TransportErrorKind,
    /// Human-readable failure detail.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error with the given classification.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an error of kind [`TransportErrorKind::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connection, message)
    }

    /// Shorthand for an error of kind [`TransportErrorKind::Unknown`].
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unknown, message)
    }

    /// Returns the classification label (snake_case).
    pub fn as_label(&self) -> &'static str {
        self.kind.as_label()
    }

    /// Indicates whether the error is safe to retry.
    ///
    /// Always `true`: the delivery loop retries every classification
    /// uniformly, bounded only by the configured attempt budget.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// # Malformed inbound payload.
///
/// Terminal for the affected payload: the inbound handler logs it and drops
/// the single notification, it never crashes the host process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DecodeError {
    /// A required field is absent.
    #[error("inbound payload is missing required field `{field}`")]
    MissingField {
        /// Name of the missing field (or field group).
        field: &'static str,
    },

    /// The payload is not valid wire format.
    #[error("malformed inbound payload: {detail}")]
    Malformed {
        /// Parser detail.
        detail: String,
    },
}

impl DecodeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::MissingField { .. } => "decode_missing_field",
            DecodeError::Malformed { .. } => "decode_malformed",
        }
    }
}

/// # Platform display failure.
///
/// Raised by the renderer collaborator; the engine logs it and moves on,
/// it is never retried and never propagated past the inbound boundary.
#[derive(Error, Debug, Clone)]
#[error("render failed: {message}")]
pub struct RenderError {
    /// Human-readable failure detail.
    pub message: String,
}

impl RenderError {
    /// Creates a render error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// # History-store failure.
///
/// Every history call site logs this and continues; a broken or disabled
/// store must never change dispatch behavior.
#[derive(Error, Debug, Clone)]
#[error("history operation failed: {message}")]
pub struct HistoryError {
    /// Human-readable failure detail.
    pub message: String,
}

impl HistoryError {
    /// Creates a history error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
