//! Delivery events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the dispatch engine and the
//! inbound handlers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload
//! - [`Bus`] broadcast wrapper with close-once teardown semantics
//! - [`LogWriter`] demo event printer (feature = `logging`)
//!
//! ## Quick reference
//! - **Publishers**: `Dispatcher::push` (added), the inbound handler
//!   (received), the tap handler (tapped).
//! - **Consumers**: anything holding a receiver from [`Bus::subscribe`];
//!   late subscribers miss past events.

mod bus;
mod event;

#[cfg(feature = "logging")]
mod log;

pub use bus::Bus;
pub use event::{Event, EventKind};

#[cfg(feature = "logging")]
pub use log::LogWriter;
