//! Recording collaborator stubs shared by the dispatch tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::channel::EffectiveChannel;
use crate::error::{RenderError, TransportError};
use crate::hooks::Hooks;
use crate::message::Message;
use crate::platform::{Renderer, Transport};

/// One recorded send attempt.
#[derive(Debug, Clone)]
pub(crate) struct SendRecord {
    pub target: String,
    pub at: Instant,
}

/// Transport stub with a per-target failure plan and a send journal.
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    /// Failures remaining before a target starts succeeding.
    /// `u32::MAX` means "always fail".
    plan: Mutex<HashMap<String, u32>>,
    default_failures: u32,
    sends: Mutex<Vec<SendRecord>>,
    pub token: Option<String>,
}

impl RecordingTransport {
    /// Every send succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails, forever.
    pub fn failing_always() -> Self {
        Self {
            default_failures: u32::MAX,
            ..Self::default()
        }
    }

    /// Every target fails `n` times, then succeeds.
    pub fn failing_times(n: u32) -> Self {
        Self {
            default_failures: n,
            ..Self::default()
        }
    }

    /// Overrides the failure count for one target (keyed by wire id).
    pub fn with_failures(self, target: &str, failures: u32) -> Self {
        self.plan
            .lock()
            .unwrap()
            .insert(target.to_owned(), failures);
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    pub fn attempts_for(&self, target: &str) -> u32 {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.target == target)
            .count() as u32
    }

    pub fn sends(&self) -> Vec<SendRecord> {
        self.sends.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        target: &str,
        _title: Option<&str>,
        _body: Option<&str>,
        _data: &Map<String, Value>,
    ) -> Result<(), TransportError> {
        self.sends.lock().unwrap().push(SendRecord {
            target: target.to_owned(),
            at: Instant::now(),
        });

        let mut plan = self.plan.lock().unwrap();
        let remaining = plan
            .entry(target.to_owned())
            .or_insert(self.default_failures);
        if *remaining == 0 {
            return Ok(());
        }
        if *remaining != u32::MAX {
            *remaining -= 1;
        }
        Err(TransportError::connection("stub refused"))
    }

    async fn subscribe_topic(&self, _topic: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn unsubscribe_topic(&self, _topic: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn token(&self) -> Result<Option<String>, TransportError> {
        Ok(self.token.clone())
    }
}

/// What the renderer stub was asked to do.
#[derive(Debug, Clone)]
pub(crate) enum RenderCall {
    Permission,
    CreateChannel(String),
    Show(i32),
    Schedule(i32, DateTime<Utc>, Option<String>),
    Cancel(i32),
    CancelAll,
}

/// Renderer stub with configurable permission/show/create outcomes.
#[derive(Debug)]
pub(crate) struct RecordingRenderer {
    pub calls: Mutex<Vec<RenderCall>>,
    pub permission: Result<bool, RenderError>,
    pub fail_create: bool,
    pub fail_show: bool,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            permission: Ok(true),
            fail_create: false,
            fail_show: false,
        }
    }
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denying_permission() -> Self {
        Self {
            permission: Ok(false),
            ..Self::default()
        }
    }

    pub fn failing_channel_setup() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn failing_show() -> Self {
        Self {
            fail_show: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn shows(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::Show(_)))
            .count()
    }

    pub fn schedules(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::Schedule(..)))
            .count()
    }

    pub fn permission_requests(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::Permission))
            .count()
    }
}

#[async_trait]
impl Renderer for RecordingRenderer {
    async fn request_permission(&self) -> Result<bool, RenderError> {
        self.calls.lock().unwrap().push(RenderCall::Permission);
        self.permission.clone()
    }

    async fn create_channel(&self, channel: &EffectiveChannel) -> Result<(), RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push(RenderCall::CreateChannel(channel.id.clone()));
        if self.fail_create {
            return Err(RenderError::new("stub channel failure"));
        }
        Ok(())
    }

    async fn show(
        &self,
        notification_id: i32,
        _title: Option<&str>,
        _body: Option<&str>,
        _channel: &EffectiveChannel,
        _payload: &Map<String, Value>,
    ) -> Result<(), RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push(RenderCall::Show(notification_id));
        if self.fail_show {
            return Err(RenderError::new("stub show failure"));
        }
        Ok(())
    }

    async fn schedule(
        &self,
        notification_id: i32,
        _title: Option<&str>,
        _body: Option<&str>,
        _channel: &EffectiveChannel,
        _payload: &Map<String, Value>,
        at: DateTime<Utc>,
        timezone: Option<&str>,
    ) -> Result<(), RenderError> {
        self.calls.lock().unwrap().push(RenderCall::Schedule(
            notification_id,
            at,
            timezone.map(str::to_owned),
        ));
        Ok(())
    }

    async fn cancel(&self, notification_id: i32) -> Result<(), RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push(RenderCall::Cancel(notification_id));
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), RenderError> {
        self.calls.lock().unwrap().push(RenderCall::CancelAll);
        Ok(())
    }
}

/// Hooks stub with an opt-in render switch and call journals.
#[derive(Debug, Default)]
pub(crate) struct RecordingHooks {
    pub show: bool,
    pub user: Option<String>,
    pub received: Mutex<Vec<String>>,
    pub selected: Mutex<Vec<String>>,
    pub tokens: Mutex<Vec<String>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn showing() -> Self {
        Self {
            show: true,
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_owned());
        self
    }

    pub fn received_ids(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.lock().unwrap().clone()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl Hooks for RecordingHooks {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn current_user_id(&self) -> Option<String> {
        self.user.clone()
    }

    async fn on_should_show(&self, _message: &Message) -> bool {
        self.show
    }

    async fn on_received(&self, message: &Message) {
        self.received.lock().unwrap().push(message.id().to_owned());
    }

    async fn on_selected(&self, message: &Message) {
        self.selected.lock().unwrap().push(message.id().to_owned());
    }

    async fn on_token_refresh(&self, token: &str) {
        self.tokens.lock().unwrap().push(token.to_owned());
    }
}
