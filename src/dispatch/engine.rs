//! # Dispatcher: fan-out delivery, lifecycle, and event publishing.
//!
//! The [`Dispatcher`] owns the event bus, the config snapshot, and the
//! three collaborator seams. It fans one message out to every target,
//! drives the per-target retry loops concurrently, and publishes the
//! completion event after the join barrier.
//!
//! ## High-level architecture
//! ```text
//! Inputs to push():
//!   Message ──► Dispatcher::push(message)
//!
//! Preparation:
//!   - snapshot Arc<Config> (concurrent replace never corrupts an op)
//!   - EffectiveChannel::for_message() (merge + message overrides)
//!   - target set: the /topics/-prefixed topic, or else the recipients
//!
//! Fan-out (concurrent, isolated):
//!   Target[0]     Target[1]    ...   Target[N-1]
//!      │              │                  │
//!      └─► deliver() (retry loop, constant delay, attempt budget)
//!
//! Join barrier:
//!   all targets terminal ──► Bus.publish(Added)   (exactly once per push)
//!                        └─► history.save(...)    (failure logged only)
//! ```
//!
//! ## Rules
//! - `push` fails **pre-flight only** (`NotInitialized`, `InvalidMessage`);
//!   transport failures inside the fan-out are absorbed per target.
//! - The `Added` event is a best-effort "dispatched" signal, not a
//!   per-target success guarantee.
//! - `init` is idempotent; `shutdown` closes the bus exactly once and
//!   cancels in-flight retry sleeps at their safe points.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::channel::EffectiveChannel;
use crate::config::Config;
use crate::dispatch::delivery::{self, DeliveryState, RetryPolicy, Target};
use crate::error::NotifyError;
use crate::events::{Bus, Event};
use crate::message::{codec, Message};
use crate::platform::{HistoryStore, NoopHistory, Renderer, Transport};

/// Coordinates channel resolution, fan-out delivery, inbound handling, and
/// event publishing.
///
/// Constructed with [`Dispatcher::new`]; collaborators beyond transport and
/// renderer are attached builder-style before first use.
///
/// ## Example
/// ```no_run
/// use std::sync::Arc;
/// use notifly::{Config, Dispatcher, Message};
/// # use async_trait::async_trait;
/// # use serde_json::{Map, Value};
/// # struct MyTransport;
/// # #[async_trait]
/// # impl notifly::Transport for MyTransport {
/// #     async fn send(&self, _: &str, _: Option<&str>, _: Option<&str>, _: &Map<String, Value>) -> Result<(), notifly::TransportError> { Ok(()) }
/// #     async fn subscribe_topic(&self, _: &str) -> Result<(), notifly::TransportError> { Ok(()) }
/// #     async fn unsubscribe_topic(&self, _: &str) -> Result<(), notifly::TransportError> { Ok(()) }
/// #     async fn token(&self) -> Result<Option<String>, notifly::TransportError> { Ok(None) }
/// # }
/// # struct MyTray;
/// # #[async_trait]
/// # impl notifly::Renderer for MyTray {
/// #     async fn request_permission(&self) -> Result<bool, notifly::RenderError> { Ok(true) }
/// #     async fn create_channel(&self, _: &notifly::EffectiveChannel) -> Result<(), notifly::RenderError> { Ok(()) }
/// #     async fn show(&self, _: i32, _: Option<&str>, _: Option<&str>, _: &notifly::EffectiveChannel, _: &Map<String, Value>) -> Result<(), notifly::RenderError> { Ok(()) }
/// #     async fn schedule(&self, _: i32, _: Option<&str>, _: Option<&str>, _: &notifly::EffectiveChannel, _: &Map<String, Value>, _: chrono::DateTime<chrono::Utc>, _: Option<&str>) -> Result<(), notifly::RenderError> { Ok(()) }
/// #     async fn cancel(&self, _: i32) -> Result<(), notifly::RenderError> { Ok(()) }
/// #     async fn cancel_all(&self) -> Result<(), notifly::RenderError> { Ok(()) }
/// # }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dispatcher = Dispatcher::new(
///     Config::default(),
///     Arc::new(MyTransport),
///     Arc::new(MyTray),
/// );
/// dispatcher.init().await?;
///
/// let mut events = dispatcher.subscribe();
///
/// let msg = Message::builder()
///     .title("Order shipped")
///     .channel("orders")
///     .recipient("device-token-1")
///     .build()?;
/// dispatcher.push(msg).await?;
///
/// let ev = events.recv().await?;
/// assert!(ev.is_added());
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    config: RwLock<Arc<Config>>,
    bus: Bus,
    transport: Arc<dyn Transport>,
    renderer: Arc<dyn Renderer>,
    history: Arc<dyn HistoryStore>,
    initialized: AtomicBool,
    runtime: CancellationToken,
}

impl Dispatcher {
    /// Creates a dispatcher with the given config and the two required
    /// collaborators. History defaults to the disabled [`NoopHistory`].
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let bus = Bus::new(config.bus_capacity_clamped());
        Self {
            config: RwLock::new(Arc::new(config)),
            bus,
            transport,
            renderer,
            history: Arc::new(NoopHistory::new()),
            initialized: AtomicBool::new(false),
            runtime: CancellationToken::new(),
        }
    }

    /// Attaches a history store (builder-style, before first use).
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = history;
        self
    }

    /// Initializes the delivery context.
    ///
    /// ### Flow
    /// 1. No-op when already initialized (idempotent).
    /// 2. Request tray permission → `PermissionDenied` on refusal/failure.
    /// 3. Register every channel (default first, then named) in effective
    ///    form → `ChannelSetup` on the first failure (fatal to init).
    /// 4. Fetch the registration token; forward it to
    ///    `hooks.on_token_refresh`. Token errors are logged, non-fatal.
    ///
    /// ### Errors
    /// Raised synchronously to the caller; the dispatcher stays
    /// uninitialized after a failed `init` and the call may be retried.
    pub async fn init(&self) -> Result<(), NotifyError> {
        if self.initialized.load(AtomicOrdering::Acquire) {
            tracing::debug!("init skipped: already initialized");
            return Ok(());
        }

        let cfg = self.config().await;

        match self.renderer.request_permission().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(NotifyError::PermissionDenied {
                    detail: "notification permission rejected".into(),
                })
            }
            Err(e) => {
                return Err(NotifyError::PermissionDenied {
                    detail: e.to_string(),
                })
            }
        }

        for channel in cfg.registered_channels() {
            let effective = EffectiveChannel::resolve(&cfg, Some(&channel.id));
            self.renderer
                .create_channel(&effective)
                .await
                .map_err(|e| NotifyError::ChannelSetup {
                    error: e.to_string(),
                })?;
        }

        match self.transport.token().await {
            Ok(Some(token)) => cfg.hooks.on_token_refresh(&token).await,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, kind = e.as_label(), "token fetch failed during init")
            }
        }

        self.initialized.store(true, AtomicOrdering::Release);
        tracing::debug!("dispatcher initialized");
        Ok(())
    }

    /// Whether `init` has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(AtomicOrdering::Acquire)
    }

    /// Returns the current config snapshot.
    ///
    /// Operations hold the snapshot they took at entry, so a concurrent
    /// [`Dispatcher::replace_config`] never produces inconsistent reads
    /// mid-operation.
    pub async fn config(&self) -> Arc<Config> {
        self.config.read().await.clone()
    }

    /// Replaces the config as a whole. In-flight operations keep their
    /// snapshot; subsequent operations observe the new value.
    pub async fn replace_config(&self, config: Config) {
        *self.config.write().await = Arc::new(config);
    }

    /// Creates a new, independent event receiver.
    ///
    /// Late subscribers miss past events; see [`Bus::subscribe`].
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// The event bus, for attaching external consumers.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Dispatches a message with history retention enabled.
    ///
    /// Shorthand for `push_with(message, true)`.
    pub async fn push(&self, message: Message) -> Result<(), NotifyError> {
        self.push_with(message, true).await
    }

    /// Dispatches a message to every target, retrying each independently.
    ///
    /// ### Flow
    /// 1. Pre-flight: `NotInitialized`, target invariant.
    /// 2. Resolve the effective channel (message overrides applied).
    /// 3. Fan out: one retry loop per target, concurrent and isolated; a
    ///    target's failure never blocks or aborts a sibling.
    /// 4. Join barrier, then exactly one `Added` event per call.
    /// 5. Optionally persist; a history failure is logged and absorbed.
    ///
    /// ### Errors
    /// Pre-flight only. Transport failures inside the fan-out never reach
    /// the caller; after retry exhaustion they are visible in logs alone.
    pub async fn push_with(
        &self,
        message: Message,
        retain_history: bool,
    ) -> Result<(), NotifyError> {
        self.ensure_initialized()?;
        if !message.has_target() {
            return Err(NotifyError::InvalidMessage {
                reason: "message has no recipients and no topic".into(),
            });
        }

        let cfg = self.config().await;
        let effective = EffectiveChannel::for_message(&cfg, &message);
        let data = codec::data_payload(&message, &effective);
        let policy = RetryPolicy {
            attempts: cfg.attempts_per_target(),
            delay: cfg.retry_delay,
        };

        // A set topic is the single logical target; the recipient list is
        // used only when no topic is present.
        let targets: Vec<Target> = match message.topic() {
            Some(topic) => vec![Target::Topic(topic.to_owned())],
            None => message
                .recipients()
                .iter()
                .cloned()
                .map(Target::Device)
                .collect(),
        };

        let outcomes = futures::future::join_all(targets.iter().map(|target| {
            delivery::deliver(
                self.transport.as_ref(),
                target,
                message.title(),
                message.body(),
                &data,
                policy,
                &self.runtime,
            )
        }))
        .await;

        let succeeded = outcomes
            .iter()
            .filter(|o| o.state == DeliveryState::Succeeded)
            .count();
        let abandoned = outcomes.iter().filter(|o| !o.state.is_terminal()).count();
        for outcome in outcomes.iter().filter(|o| !o.state.is_terminal()) {
            tracing::debug!(
                target = %outcome.target.wire_id(),
                attempts = outcome.attempts,
                "delivery abandoned by shutdown"
            );
        }
        tracing::debug!(
            id = %message.id(),
            targets = outcomes.len(),
            succeeded,
            failed = outcomes.len() - succeeded - abandoned,
            abandoned,
            "dispatch complete"
        );

        self.bus.publish(Event::added(message.clone()));

        if retain_history {
            let user = cfg.hooks.current_user_id();
            if let Err(e) = self.history.save(user.as_deref(), &message).await {
                tracing::warn!(error = %e, id = %message.id(), "history save failed");
            }
        }

        Ok(())
    }

    /// Subscribes this installation to a topic via the transport.
    pub async fn subscribe_topic(&self, topic: &str) -> Result<(), NotifyError> {
        self.ensure_initialized()?;
        self.transport.subscribe_topic(topic).await?;
        Ok(())
    }

    /// Unsubscribes this installation from a topic via the transport.
    pub async fn unsubscribe_topic(&self, topic: &str) -> Result<(), NotifyError> {
        self.ensure_initialized()?;
        self.transport.unsubscribe_topic(topic).await?;
        Ok(())
    }

    /// Returns the current registration token, if one has been issued.
    pub async fn token(&self) -> Result<Option<String>, NotifyError> {
        self.ensure_initialized()?;
        Ok(self.transport.token().await?)
    }

    /// Removes one displayed or scheduled notification from the tray.
    pub async fn cancel(&self, notification_id: i32) -> Result<(), NotifyError> {
        self.ensure_initialized()?;
        self.renderer.cancel(notification_id).await?;
        Ok(())
    }

    /// Removes every displayed and scheduled notification from the tray.
    pub async fn cancel_all(&self) -> Result<(), NotifyError> {
        self.ensure_initialized()?;
        self.renderer.cancel_all().await?;
        Ok(())
    }

    /// The history store, for seen-tracking and queries by the host app.
    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    /// Tears the dispatcher down: cancels in-flight retry sleeps at their
    /// safe points and closes the bus. Idempotent.
    pub fn shutdown(&self) {
        self.runtime.cancel();
        self.bus.close();
    }

    pub(crate) fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<(), NotifyError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(NotifyError::NotInitialized)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::Instant;

    use super::*;
    use crate::dispatch::support::{RecordingHooks, RecordingRenderer, RecordingTransport};
    use crate::events::EventKind;
    use crate::platform::MemoryHistory;

    fn config(max_retries: u32) -> Config {
        let mut cfg = Config::default();
        cfg.max_retries = max_retries;
        cfg
    }

    async fn ready(
        cfg: Config,
        transport: Arc<RecordingTransport>,
        renderer: Arc<RecordingRenderer>,
    ) -> Dispatcher {
        let d = Dispatcher::new(cfg, transport, renderer);
        d.init().await.unwrap();
        d
    }

    fn drain_kinds(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    #[tokio::test]
    async fn test_push_before_init_fails() {
        let d = Dispatcher::new(
            Config::default(),
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingRenderer::new()),
        );
        let msg = Message::builder().title("T").recipient("d").build().unwrap();
        let err = d.push(msg).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotInitialized));
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let renderer = Arc::new(RecordingRenderer::new());
        let d = ready(
            Config::default(),
            Arc::new(RecordingTransport::new()),
            renderer.clone(),
        )
        .await;

        d.init().await.unwrap();
        assert_eq!(
            renderer.permission_requests(),
            1,
            "second init must be a no-op"
        );
        assert!(d.is_initialized());
    }

    #[tokio::test]
    async fn test_init_registers_default_and_named_channels() {
        let mut cfg = Config::default();
        cfg.channels = vec![crate::channel::Channel::new("promo", "Promotions")];
        let renderer = Arc::new(RecordingRenderer::new());
        ready(cfg, Arc::new(RecordingTransport::new()), renderer.clone()).await;

        let created: Vec<String> = renderer
            .calls()
            .iter()
            .filter_map(|c| match c {
                crate::dispatch::support::RenderCall::CreateChannel(id) => Some(id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(created, ["default", "promo"]);
    }

    #[tokio::test]
    async fn test_init_permission_denied() {
        let d = Dispatcher::new(
            Config::default(),
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingRenderer::denying_permission()),
        );
        let err = d.init().await.unwrap_err();
        assert!(matches!(err, NotifyError::PermissionDenied { .. }));
        assert!(!d.is_initialized());
    }

    #[tokio::test]
    async fn test_init_channel_setup_failure_is_fatal() {
        let d = Dispatcher::new(
            Config::default(),
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingRenderer::failing_channel_setup()),
        );
        let err = d.init().await.unwrap_err();
        assert!(matches!(err, NotifyError::ChannelSetup { .. }));
        assert!(!d.is_initialized());
    }

    #[tokio::test]
    async fn test_init_forwards_token_to_hooks() {
        let hooks = Arc::new(RecordingHooks::new());
        let mut cfg = Config::default();
        cfg.hooks = hooks.clone();
        ready(
            cfg,
            Arc::new(RecordingTransport::new().with_token("tok-1")),
            Arc::new(RecordingRenderer::new()),
        )
        .await;
        assert_eq!(hooks.tokens_seen(), ["tok-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_and_no_escaping_error() {
        let transport = Arc::new(RecordingTransport::failing_always());
        let d = ready(config(3), transport.clone(), Arc::new(RecordingRenderer::new())).await;

        let msg = Message::builder()
            .title("T")
            .recipient("dev1")
            .build()
            .unwrap();
        let start = Instant::now();
        d.push(msg).await.expect("exhausted retries must not surface");

        assert_eq!(transport.attempts_for("dev1"), 3);
        // Two constant 5s delays between the three attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        let spacing: Vec<Duration> = transport
            .sends()
            .windows(2)
            .map(|w| w[1].at - w[0].at)
            .collect();
        assert_eq!(spacing, [Duration::from_secs(5), Duration::from_secs(5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_isolation() {
        // dev-a always fails, dev-b succeeds immediately.
        let transport =
            Arc::new(RecordingTransport::new().with_failures("dev-a", u32::MAX));
        let d = ready(config(3), transport.clone(), Arc::new(RecordingRenderer::new())).await;
        let mut rx = d.subscribe();

        let msg = Message::builder()
            .title("T")
            .recipients(["dev-a", "dev-b"])
            .build()
            .unwrap();
        let start = Instant::now();
        d.push(msg).await.unwrap();

        // b's single success happened at t=0, undelayed by a's retries.
        let b_sends: Vec<_> = transport
            .sends()
            .into_iter()
            .filter(|r| r.target == "dev-b")
            .collect();
        assert_eq!(b_sends.len(), 1);
        assert_eq!(b_sends[0].at, start);
        assert_eq!(transport.attempts_for("dev-a"), 3);

        // Exactly one Added event, after both targets completed.
        assert_eq!(drain_kinds(&mut rx), [EventKind::Added]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_scenario() {
        // dev1 fails once then succeeds; dev2 succeeds immediately.
        let transport = Arc::new(RecordingTransport::new().with_failures("dev1", 1));
        let history = Arc::new(MemoryHistory::new());
        let mut cfg = config(2);
        cfg.channels = vec![crate::channel::Channel::new("promo", "Promotions")];
        let d = Dispatcher::new(cfg, transport.clone(), Arc::new(RecordingRenderer::new()))
            .with_history(history.clone());
        d.init().await.unwrap();
        let mut rx = d.subscribe();

        let msg = Message::builder()
            .recipients(["dev1", "dev2"])
            .title("T")
            .body("B")
            .channel("promo")
            .build()
            .unwrap();
        let id = msg.id().to_owned();
        d.push(msg).await.unwrap();

        assert_eq!(transport.attempts_for("dev1"), 2);
        assert_eq!(transport.attempts_for("dev2"), 1);

        let ev = rx.try_recv().unwrap();
        assert!(ev.is_added());
        assert_eq!(ev.message.unwrap().id(), id);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        let saved = history.query_by_user(None).await.unwrap();
        assert_eq!(saved.len(), 1, "save must be invoked exactly once");
        assert_eq!(saved[0].id(), id);
    }

    #[tokio::test]
    async fn test_topic_target_gets_wire_prefix() {
        let transport = Arc::new(RecordingTransport::new());
        let d = ready(config(1), transport.clone(), Arc::new(RecordingRenderer::new())).await;

        let msg = Message::builder().title("T").topic("news").build().unwrap();
        d.push(msg).await.unwrap();

        assert_eq!(transport.attempts_for("/topics/news"), 1);
    }

    #[tokio::test]
    async fn test_topic_wins_over_recipients() {
        let transport = Arc::new(RecordingTransport::new());
        let d = ready(config(1), transport.clone(), Arc::new(RecordingRenderer::new())).await;

        let msg = Message::builder()
            .title("T")
            .recipient("dev1")
            .topic("news")
            .build()
            .unwrap();
        d.push(msg).await.unwrap();

        assert_eq!(transport.attempts_for("/topics/news"), 1);
        assert_eq!(transport.attempts_for("dev1"), 0);
    }

    #[tokio::test]
    async fn test_push_without_history_retention_skips_save() {
        let transport = Arc::new(RecordingTransport::new());
        let history = Arc::new(MemoryHistory::new());
        let d = Dispatcher::new(
            config(1),
            transport,
            Arc::new(RecordingRenderer::new()),
        )
        .with_history(history.clone());
        d.init().await.unwrap();

        let msg = Message::builder().title("T").recipient("d").build().unwrap();
        d.push_with(msg, false).await.unwrap();
        assert!(history.query_by_user(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_records_current_user() {
        let hooks = Arc::new(RecordingHooks::new().with_user("user-7"));
        let history = Arc::new(MemoryHistory::new());
        let mut cfg = config(1);
        cfg.hooks = hooks;
        let d = Dispatcher::new(
            cfg,
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingRenderer::new()),
        )
        .with_history(history.clone());
        d.init().await.unwrap();

        let msg = Message::builder().title("T").recipient("d").build().unwrap();
        d.push(msg).await.unwrap();
        assert_eq!(history.query_by_user(Some("user-7")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_config_replacement_does_not_corrupt_in_flight_snapshot() {
        let transport = Arc::new(RecordingTransport::new());
        let d = Arc::new(ready(config(1), transport.clone(), Arc::new(RecordingRenderer::new())).await);

        // Replace config while nothing is in flight, then push: the op
        // observes the new snapshot atomically.
        d.replace_config(config(1)).await;
        let msg = Message::builder().title("T").recipient("d").build().unwrap();
        d.push(msg).await.unwrap();
        assert_eq!(transport.attempts_for("d"), 1);
    }

    #[tokio::test]
    async fn test_topic_subscribe_requires_init() {
        let d = Dispatcher::new(
            Config::default(),
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingRenderer::new()),
        );
        assert!(matches!(
            d.subscribe_topic("news").await.unwrap_err(),
            NotifyError::NotInitialized
        ));
    }

    #[tokio::test]
    async fn test_cancel_forwards_to_renderer() {
        let renderer = Arc::new(RecordingRenderer::new());
        let d = ready(
            config(1),
            Arc::new(RecordingTransport::new()),
            renderer.clone(),
        )
        .await;

        d.cancel(42).await.unwrap();
        d.cancel_all().await.unwrap();

        let calls = renderer.calls();
        assert!(calls
            .iter()
            .any(|c| matches!(c, crate::dispatch::support::RenderCall::Cancel(42))));
        assert!(calls
            .iter()
            .any(|c| matches!(c, crate::dispatch::support::RenderCall::CancelAll)));
    }

    #[tokio::test]
    async fn test_shutdown_closes_bus_and_silences_events() {
        let d = ready(
            config(1),
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingRenderer::new()),
        )
        .await;
        let mut rx = d.subscribe();

        d.shutdown();
        d.shutdown(); // close-once: second call is a no-op
        assert!(d.bus().is_closed());

        let msg = Message::builder().title("T").recipient("d").build().unwrap();
        d.push(msg).await.unwrap();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
