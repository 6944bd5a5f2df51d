//! # Inbound boundary: transport payloads and user taps.
//!
//! These entry points are invoked by the transport collaborator, not by
//! application code. Nothing here may crash the host process: decode and
//! render failures are logged and the affected single payload is dropped.
//!
//! ## Event flow
//! ```text
//! Inbound payload:
//!   decode ──err──► log, halt (no event)
//!     │
//!     ├─► hooks.on_received()
//!     ├─► hooks.on_should_show()? ──true──► renderer.show()/schedule()
//!     │                                        (failure logged, never raised)
//!     └─► Bus.publish(Received)       (unconditional after decode)
//!
//! User tap:
//!   decode ──err──► log, halt (no event)
//!     ├─► hooks.on_selected()
//!     └─► Bus.publish(Tapped)
//! ```
//!
//! ## Rules
//! - The render default is **silent**: without a hooks opt-in nothing is
//!   displayed, but the `Received` event still fires.
//! - `schedule_at` routes to the platform scheduler instead of an
//!   immediate show.

use crate::channel::EffectiveChannel;
use crate::dispatch::engine::Dispatcher;
use crate::events::Event;
use crate::message::codec;

impl Dispatcher {
    /// Handles one raw payload delivered by the transport.
    ///
    /// Never returns an error: every failure mode is logged and terminal
    /// for this payload only.
    pub async fn on_transport_message(&self, raw: &[u8]) {
        if self.ensure_initialized().is_err() {
            tracing::warn!("inbound payload before init; dropped");
            return;
        }

        let message = match codec::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, kind = e.as_label(), "inbound payload dropped");
                return;
            }
        };

        let cfg = self.config().await;
        cfg.hooks.on_received(&message).await;

        if cfg.hooks.on_should_show(&message).await {
            let effective = EffectiveChannel::for_message(&cfg, &message);
            let rendered = match message.schedule_at() {
                Some(schedule) => {
                    self.renderer()
                        .schedule(
                            message.notification_id(),
                            message.title(),
                            message.body(),
                            &effective,
                            message.payload(),
                            schedule.at,
                            schedule.timezone.as_deref(),
                        )
                        .await
                }
                None => {
                    self.renderer()
                        .show(
                            message.notification_id(),
                            message.title(),
                            message.body(),
                            &effective,
                            message.payload(),
                        )
                        .await
                }
            };
            if let Err(e) = rendered {
                tracing::warn!(error = %e, id = %message.id(), "render failed");
            }
        }

        self.bus().publish(Event::received(message));
    }

    /// Handles a user tap on a displayed notification.
    ///
    /// Never returns an error; a decode failure is logged and the sequence
    /// halts, consistent with the inbound handler.
    pub async fn on_user_selected(&self, raw: &[u8]) {
        if self.ensure_initialized().is_err() {
            tracing::warn!("tap payload before init; dropped");
            return;
        }

        let message = match codec::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, kind = e.as_label(), "tap payload dropped");
                return;
            }
        };

        let cfg = self.config().await;
        cfg.hooks.on_selected(&message).await;

        self.bus().publish(Event::tapped(message));
    }
}
