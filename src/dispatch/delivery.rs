//! # Per-target delivery: retry state machine.
//!
//! One [`deliver`] call owns the full attempt sequence for **one** target.
//! The fan-out in the engine runs many of these concurrently; nothing in
//! here knows about sibling targets, which is what guarantees the
//! isolation invariant (one target's failure never blocks or aborts
//! another's attempts).
//!
//! ## State machine
//! ```text
//! Pending ──► Attempting ──► Succeeded                (terminal)
//!                 │
//!                 └──► FailedRetryable ──► [sleep delay] ──► Attempting
//!                 │
//!                 └──► FailedExhausted               (terminal, attempt budget spent)
//! ```
//!
//! ## Rules
//! - Attempts within one target are **strictly ordered**: attempt `n+1`
//!   never starts before attempt `n` failed and the delay elapsed.
//! - The delay is **constant** (no growth, no jitter) per the reference
//!   policy; it comes straight from the config snapshot.
//! - Transport errors are absorbed here: logged with their classification
//!   label, never returned to the caller.
//! - Cancellation is honored at the safe points only (the retry sleep);
//!   an in-flight send is awaited to completion.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::platform::Transport;

/// Wire-id prefix distinguishing a topic target from a device token.
pub(crate) const TOPIC_PREFIX: &str = "/topics/";

/// One recipient of a dispatch: a device registration or a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// A per-device registration token.
    Device(String),
    /// A topic name (unprefixed).
    Topic(String),
}

impl Target {
    /// The id handed to the transport: device tokens verbatim, topics with
    /// the topic marker prefixed.
    pub(crate) fn wire_id(&self) -> String {
        match self {
            Target::Device(token) => token.clone(),
            Target::Topic(name) => format!("{TOPIC_PREFIX}{name}"),
        }
    }
}

/// Where one target's attempt sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryState {
    /// No attempt started yet.
    Pending,
    /// A send is in flight.
    Attempting,
    /// A send succeeded (terminal).
    Succeeded,
    /// The last send failed and a retry is scheduled.
    FailedRetryable,
    /// The attempt budget is spent (terminal).
    FailedExhausted,
}

impl DeliveryState {
    /// Whether the state ends the attempt sequence.
    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, DeliveryState::Succeeded | DeliveryState::FailedExhausted)
    }
}

/// Retry parameters for one dispatch, snapshotted from the config.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    /// Attempts total for one target (never zero).
    pub attempts: u32,
    /// Constant wait between consecutive attempts.
    pub delay: Duration,
}

/// Final outcome of one target's attempt sequence.
#[derive(Debug, Clone)]
pub(crate) struct DeliveryOutcome {
    pub target: Target,
    pub attempts: u32,
    pub state: DeliveryState,
}

/// Runs the full attempt sequence for one target.
///
/// ### Flow
/// 1. Send once via the transport.
/// 2. On failure, wait `policy.delay` (cancellable) and send again, up to
///    `policy.attempts` attempts total.
/// 3. Return the terminal outcome; errors never escape.
///
/// ### Cancellation semantics
/// The runtime token is checked before each attempt and aborts the retry
/// sleep. A cancelled sequence returns its last (possibly non-terminal)
/// state; the engine logs it as abandoned.
pub(crate) async fn deliver(
    transport: &dyn Transport,
    target: &Target,
    title: Option<&str>,
    body: Option<&str>,
    data: &Map<String, Value>,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> DeliveryOutcome {
    let wire = target.wire_id();
    let mut state = DeliveryState::Pending;
    let mut attempt: u32 = 0;

    while attempt < policy.attempts {
        if cancel.is_cancelled() {
            break;
        }

        attempt += 1;
        state = DeliveryState::Attempting;
        tracing::trace!(target = %wire, attempt, state = ?state, "attempting delivery");

        match transport.send(&wire, title, body, data).await {
            Ok(()) => {
                state = DeliveryState::Succeeded;
                tracing::debug!(target = %wire, attempt, "delivered");
                break;
            }
            Err(e) => {
                if attempt >= policy.attempts {
                    state = DeliveryState::FailedExhausted;
                    tracing::warn!(
                        target = %wire,
                        error = %e,
                        kind = e.as_label(),
                        attempts = attempt,
                        "delivery exhausted"
                    );
                    break;
                }

                state = DeliveryState::FailedRetryable;
                tracing::debug!(
                    target = %wire,
                    error = %e,
                    kind = e.as_label(),
                    attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    "delivery failed; retry scheduled"
                );

                let sleep = time::sleep(policy.delay);
                tokio::pin!(sleep);
                select! {
                    _ = &mut sleep => {}
                    _ = cancel.cancelled() => break,
                }
            }
        }
    }

    DeliveryOutcome {
        target: target.clone(),
        attempts: attempt,
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::support::RecordingTransport;

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_topic_targets_get_the_wire_prefix() {
        assert_eq!(Target::Topic("news".into()).wire_id(), "/topics/news");
        assert_eq!(Target::Device("tok".into()).wire_id(), "tok");
    }

    #[test]
    fn test_terminal_states() {
        assert!(DeliveryState::Succeeded.is_terminal());
        assert!(DeliveryState::FailedExhausted.is_terminal());
        assert!(!DeliveryState::Pending.is_terminal());
        assert!(!DeliveryState::Attempting.is_terminal());
        assert!(!DeliveryState::FailedRetryable.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_target_uses_exactly_the_attempt_budget() {
        let transport = RecordingTransport::failing_always();
        let cancel = CancellationToken::new();
        let start = time::Instant::now();

        let outcome = deliver(
            &transport,
            &Target::Device("dev1".into()),
            Some("T"),
            None,
            &Map::new(),
            policy(3),
            &cancel,
        )
        .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.state, DeliveryState::FailedExhausted);
        assert_eq!(transport.attempts_for("dev1"), 3);
        // Two constant 5s delays between three attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_budget_never_sleeps() {
        let transport = RecordingTransport::failing_always();
        let cancel = CancellationToken::new();
        let start = time::Instant::now();

        let outcome = deliver(
            &transport,
            &Target::Device("dev1".into()),
            Some("T"),
            None,
            &Map::new(),
            policy(1),
            &cancel,
        )
        .await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.state, DeliveryState::FailedExhausted);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_one_failure_stops_retrying() {
        let transport = RecordingTransport::failing_times(1);
        let cancel = CancellationToken::new();

        let outcome = deliver(
            &transport,
            &Target::Device("dev1".into()),
            Some("T"),
            None,
            &Map::new(),
            policy(5),
            &cancel,
        )
        .await;

        assert_eq!(outcome.state, DeliveryState::Succeeded);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(transport.attempts_for("dev1"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_the_retry_sleep() {
        let transport = RecordingTransport::failing_always();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = deliver(
            &transport,
            &Target::Device("dev1".into()),
            Some("T"),
            None,
            &Map::new(),
            policy(3),
            &cancel,
        )
        .await;

        assert_eq!(outcome.attempts, 0);
        assert_eq!(outcome.state, DeliveryState::Pending);
    }
}
