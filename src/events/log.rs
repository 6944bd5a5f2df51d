//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] drains a bus receiver and prints events to stdout in a
//! human-readable format. This is primarily useful for development,
//! debugging, and examples.
//!
//! ## Output format
//! ```text
//! [added] id=msg-1 targets=2
//! [received] id=msg-9 channel=promo
//! [tapped] id=msg-9
//! ```

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::bus::Bus;
use super::event::EventKind;

/// Simple stdout event printer.
///
/// Enabled via the `logging` feature. Not intended for production use -
/// subscribe to the bus directly for structured logging or metrics.
pub struct LogWriter;

impl LogWriter {
    /// Subscribes to the bus and spawns a worker that prints every event
    /// until the receiver's sender side is dropped.
    pub fn attach(bus: &Bus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let id = ev
                            .message
                            .as_ref()
                            .map(|m| m.id().to_owned())
                            .unwrap_or_default();
                        match ev.kind {
                            EventKind::Added => {
                                let targets = ev
                                    .message
                                    .as_ref()
                                    .map(|m| m.recipients().len().max(usize::from(m.topic().is_some())))
                                    .unwrap_or(0);
                                println!("[added] id={id} targets={targets}");
                            }
                            EventKind::Received => {
                                let channel = ev
                                    .message
                                    .as_ref()
                                    .and_then(|m| m.channel())
                                    .unwrap_or("default");
                                println!("[received] id={id} channel={channel}");
                            }
                            EventKind::Tapped => {
                                println!("[tapped] id={id}");
                            }
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        println!("[log-writer] skipped {n} events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
