//! # notifly
//!
//! **notifly** is a client-side notification delivery library for Rust.
//!
//! Given a logical notification, it resolves display/channel settings,
//! fans the notification out to one or more recipient device registrations
//! (or a topic), retries failed per-recipient deliveries, and publishes a
//! uniform event stream describing what happened. The surrounding app
//! never talks to the messaging transport or the platform notification
//! tray directly; it talks to this layer.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!     │   Message    │    │    Config    │    │    Hooks     │
//!     │ (value obj)  │    │  (snapshot)  │    │ (callbacks)  │
//!     └──────┬───────┘    └──────┬───────┘    └──────┬───────┘
//!            ▼                   ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher (delivery engine)                                     │
//! │  - EffectiveChannel resolution (merge over the default channel)   │
//! │  - per-target retry loops (concurrent, isolated, constant delay)  │
//! │  - Bus (broadcast events)                                         │
//! │  - inbound boundary (decode → hooks → render → event)             │
//! └──────┬──────────────────────┬──────────────────────┬──────────────┘
//!        ▼                      ▼                      ▼
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │  Transport   │      │   Renderer   │      │ HistoryStore │
//! │ (push send)  │      │ (tray show)  │      │ (records)    │
//! └──────────────┘      └──────────────┘      └──────────────┘
//! ```
//!
//! ### Dispatch lifecycle
//! ```text
//! Message ──► Dispatcher::push()
//!
//! for each target (concurrently, isolated):
//!   loop {
//!     ├─► attempt += 1
//!     ├─► transport.send(target, ...)
//!     │     ├─ Ok  ──► Succeeded, exit loop
//!     │     └─ Err ──► attempt budget left?
//!     │           ├─ no  ─► FailedExhausted, exit loop (logged, absorbed)
//!     │           └─ yes ─► sleep(retry_delay), continue
//!   }
//!
//! join barrier (all targets terminal)
//!   ├─► Bus.publish(Added)        exactly once per push
//!   └─► history.save(message)     failure logged, never raised
//! ```
//!
//! ## Features
//! | Area            | Description                                                   | Key types / traits                  |
//! |-----------------|---------------------------------------------------------------|-------------------------------------|
//! | **Dispatch**    | Fan-out with bounded per-target retry and a join barrier.     | [`Dispatcher`]                      |
//! | **Channels**    | Merge-based resolution of display attributes.                 | [`Channel`], [`EffectiveChannel`]   |
//! | **Messages**    | Immutable value objects with construction-time invariants.    | [`Message`], [`MessageBuilder`]     |
//! | **Events**      | Broadcast stream of received/tapped/added events.             | [`Event`], [`EventKind`], [`Bus`]   |
//! | **Hooks**       | Application callbacks with an explicit silent render default. | [`Hooks`], [`NoopHooks`]            |
//! | **Collaborators** | Replaceable transport, tray, and history seams.             | [`Transport`], [`Renderer`], [`HistoryStore`] |
//! | **Errors**      | Typed taxonomy with stable log labels.                        | [`NotifyError`], [`TransportError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::{Map, Value};
//! use notifly::{Config, Dispatcher, Message, RenderError, TransportError};
//!
//! struct PushSdk;
//!
//! #[async_trait]
//! impl notifly::Transport for PushSdk {
//!     async fn send(&self, target: &str, _t: Option<&str>, _b: Option<&str>,
//!                   _data: &Map<String, Value>) -> Result<(), TransportError> {
//!         // hand off to the provider SDK...
//!         let _ = target;
//!         Ok(())
//!     }
//!     async fn subscribe_topic(&self, _: &str) -> Result<(), TransportError> { Ok(()) }
//!     async fn unsubscribe_topic(&self, _: &str) -> Result<(), TransportError> { Ok(()) }
//!     async fn token(&self) -> Result<Option<String>, TransportError> { Ok(None) }
//! }
//!
//! struct Tray;
//!
//! #[async_trait]
//! impl notifly::Renderer for Tray {
//!     async fn request_permission(&self) -> Result<bool, RenderError> { Ok(true) }
//!     async fn create_channel(&self, _: &notifly::EffectiveChannel) -> Result<(), RenderError> { Ok(()) }
//!     async fn show(&self, _: i32, _: Option<&str>, _: Option<&str>,
//!                   _: &notifly::EffectiveChannel, _: &Map<String, Value>) -> Result<(), RenderError> { Ok(()) }
//!     async fn schedule(&self, _: i32, _: Option<&str>, _: Option<&str>,
//!                       _: &notifly::EffectiveChannel, _: &Map<String, Value>,
//!                       _: chrono::DateTime<chrono::Utc>, _: Option<&str>) -> Result<(), RenderError> { Ok(()) }
//!     async fn cancel(&self, _: i32) -> Result<(), RenderError> { Ok(()) }
//!     async fn cancel_all(&self) -> Result<(), RenderError> { Ok(()) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(Config::default(), Arc::new(PushSdk), Arc::new(Tray));
//!     dispatcher.init().await?;
//!
//!     let mut events = dispatcher.subscribe();
//!
//!     dispatcher.push(
//!         Message::builder()
//!             .title("Order shipped")
//!             .body("Your order #1042 is on its way")
//!             .channel("orders")
//!             .recipients(["device-token-1", "device-token-2"])
//!             .build()?,
//!     ).await?;
//!
//!     let ev = events.recv().await?;
//!     assert!(ev.is_added());
//!
//!     dispatcher.shutdown();
//!     Ok(())
//! }
//! ```

mod channel;
mod config;
mod dispatch;
mod error;
mod events;
mod hooks;
mod message;
mod platform;

// ---- Public re-exports ----

pub use channel::{Channel, ChannelGroup, EffectiveChannel, Importance};
pub use config::{Config, Credentials};
pub use dispatch::Dispatcher;
pub use error::{
    DecodeError, HistoryError, NotifyError, RenderError, TransportError, TransportErrorKind,
};
pub use events::{Bus, Event, EventKind};
pub use hooks::{Hooks, NoopHooks};
pub use message::{Message, MessageBuilder, Schedule};
pub use platform::{HistoryStore, MemoryHistory, NoopHistory, Renderer, Transport};

// Optional: expose a simple built-in event printer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use events::LogWriter;
