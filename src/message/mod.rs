//! Message data model and wire codec.
//!
//! ## Contents
//! - [`Message`], [`MessageBuilder`], [`Schedule`] immutable notification
//!   value object with construction-time invariants
//! - [`codec`] decode/encode at the transport boundary
//!
//! ## Quick reference
//! - Outbound messages are built with [`Message::builder`], which enforces
//!   the target and content invariants.
//! - Inbound messages are decoded by [`codec::decode`], which enforces the
//!   content invariant only (the payload already arrived at this device).

pub(crate) mod codec;
mod message;

pub use message::{Message, MessageBuilder, Schedule};
