//! Collaborator seams: transport, tray renderer, history store.
//!
//! The engine never talks to a push provider or the platform tray
//! directly; it goes through these traits. They carry no decision logic
//! of their own — all branching policy lives in the dispatch engine.
//!
//! ## Contents
//! - [`Transport`] push-messaging transport (send, topics, token)
//! - [`Renderer`] platform notification tray (permission, channels,
//!   show/schedule/cancel)
//! - [`HistoryStore`] persistent notification history, with
//!   [`NoopHistory`] (disabled) and [`MemoryHistory`] (in-process
//!   reference implementation)

mod history;
mod render;
mod transport;

pub use history::{HistoryStore, MemoryHistory, NoopHistory};
pub use render::Renderer;
pub use transport::Transport;
