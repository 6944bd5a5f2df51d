//! # Application hooks.
//!
//! [`Hooks`] is the extension point for the host application: it carries the
//! current-user accessor and the optional callbacks the engine invokes at
//! well-defined points. Every method has a default, so implementors override
//! only what they need.
//!
//! ## The render default is deliberately silent
//! [`Hooks::on_should_show`] defaults to `false`: an inbound notification is
//! **not** rendered unless a hooks implementation opts in. This asymmetric
//! default is an explicit, tested policy, not a missing-callback artifact.
//!
//! ## Rules
//! - Hooks run inline on the inbound/dispatch path; use async I/O and keep
//!   them quick.
//! - Handle errors internally; do not panic.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use notifly::{Hooks, Message};
//!
//! struct AppHooks;
//!
//! #[async_trait]
//! impl Hooks for AppHooks {
//!     fn name(&self) -> &'static str { "app" }
//!
//!     fn current_user_id(&self) -> Option<String> {
//!         Some("user-17".into())
//!     }
//!
//!     async fn on_should_show(&self, message: &Message) -> bool {
//!         // Render everything except silent data-only pings.
//!         message.title().is_some()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::message::Message;

/// Strategy interface for application callbacks.
///
/// A single implementation is installed via
/// [`Config::hooks`](crate::Config::hooks); [`NoopHooks`] is the default.
#[async_trait]
pub trait Hooks: Send + Sync + 'static {
    /// Returns the hook set name used in logs.
    ///
    /// Prefer short, descriptive names. The default uses
    /// `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the id of the currently signed-in user, if any.
    ///
    /// Used to scope history records. Default: `None`.
    fn current_user_id(&self) -> Option<String> {
        None
    }

    /// Decides whether an inbound message is rendered in the tray.
    ///
    /// Default: `false` — silent unless an implementation opts in.
    async fn on_should_show(&self, message: &Message) -> bool {
        let _ = message;
        false
    }

    /// Called for every decoded inbound message, before the render decision.
    async fn on_received(&self, message: &Message) {
        let _ = message;
    }

    /// Called when the user taps a displayed notification.
    async fn on_selected(&self, message: &Message) {
        let _ = message;
    }

    /// Called when the transport reports a (new) registration token.
    async fn on_token_refresh(&self, token: &str) {
        let _ = token;
    }
}

/// Default hook set: no user, no callbacks, never renders.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

#[async_trait]
impl Hooks for NoopHooks {
    fn name(&self) -> &'static str {
        "noop"
    }
}
