//! # Notification history store.
//!
//! [`HistoryStore`] persists one record per message, keyed by id, with the
//! seen flag as the only field mutated post-creation (via field-wise copy).
//!
//! Two built-in implementations:
//! - [`NoopHistory`] — disabled store: every operation logs and no-ops.
//!   Substituting it must never change dispatch behavior.
//! - [`MemoryHistory`] — in-process reference implementation with ordered
//!   queries and a live unseen count.
//!
//! ## Rules
//! - The engine logs store failures and continues; [`HistoryError`] never
//!   crosses the public dispatch surface.
//! - `unseen_count` is a [`watch`] receiver: the current value is always
//!   readable, changes are pushed.

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};

use crate::error::HistoryError;
use crate::message::Message;

/// # Persistent notification history.
///
/// Records are scoped to an optional user id captured at save time (the
/// engine passes the hooks' current user).
#[async_trait]
pub trait HistoryStore: Send + Sync + 'static {
    /// Saves (or replaces) the record for `message.id()`.
    async fn save(&self, user_id: Option<&str>, message: &Message) -> Result<(), HistoryError>;

    /// Returns the record with the given id, if any.
    async fn get(&self, id: &str) -> Result<Option<Message>, HistoryError>;

    /// Deletes the record with the given id. Unknown ids are a no-op.
    async fn delete(&self, id: &str) -> Result<(), HistoryError>;

    /// Marks one record as seen.
    async fn mark_seen(&self, id: &str) -> Result<(), HistoryError>;

    /// Marks every record (optionally scoped to a user) as seen.
    async fn mark_all_seen(&self, user_id: Option<&str>) -> Result<(), HistoryError>;

    /// Returns records (optionally scoped to a user), newest first.
    async fn query_by_user(&self, user_id: Option<&str>) -> Result<Vec<Message>, HistoryError>;

    /// Live count of unseen records; the value updates on every change.
    fn unseen_count(&self) -> watch::Receiver<usize>;
}

/// Disabled history store: logs and drops every operation.
///
/// Substituting this for a real store silently turns history off without
/// touching dispatch behavior.
#[derive(Debug)]
pub struct NoopHistory {
    unseen: watch::Sender<usize>,
}

impl NoopHistory {
    /// Creates a disabled store.
    pub fn new() -> Self {
        let (unseen, _) = watch::channel(0);
        Self { unseen }
    }
}

impl Default for NoopHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for NoopHistory {
    async fn save(&self, _user_id: Option<&str>, message: &Message) -> Result<(), HistoryError> {
        tracing::debug!(id = %message.id(), "history disabled; save dropped");
        Ok(())
    }

    async fn get(&self, _id: &str) -> Result<Option<Message>, HistoryError> {
        Ok(None)
    }

    async fn delete(&self, id: &str) -> Result<(), HistoryError> {
        tracing::debug!(id, "history disabled; delete dropped");
        Ok(())
    }

    async fn mark_seen(&self, id: &str) -> Result<(), HistoryError> {
        tracing::debug!(id, "history disabled; mark_seen dropped");
        Ok(())
    }

    async fn mark_all_seen(&self, _user_id: Option<&str>) -> Result<(), HistoryError> {
        tracing::debug!("history disabled; mark_all_seen dropped");
        Ok(())
    }

    async fn query_by_user(&self, _user_id: Option<&str>) -> Result<Vec<Message>, HistoryError> {
        Ok(Vec::new())
    }

    fn unseen_count(&self) -> watch::Receiver<usize> {
        self.unseen.subscribe()
    }
}

/// One stored record: the message plus the user it was saved under.
#[derive(Debug, Clone)]
struct HistoryRecord {
    user_id: Option<String>,
    message: Message,
}

/// In-process history store.
///
/// Keeps full records in memory; useful as the reference implementation
/// and for tests. The seen flag is updated by replacing the stored message
/// with a field-wise copy, never by mutating in place.
#[derive(Debug)]
pub struct MemoryHistory {
    records: RwLock<Vec<HistoryRecord>>,
    unseen: watch::Sender<usize>,
}

impl MemoryHistory {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (unseen, _) = watch::channel(0);
        Self {
            records: RwLock::new(Vec::new()),
            unseen,
        }
    }

    /// Recomputes and pushes the unseen count. Call with the write lock
    /// already released or held — only reads the slice it is given.
    fn push_unseen(&self, records: &[HistoryRecord]) {
        let count = records.iter().filter(|r| !r.message.seen()).count();
        self.unseen.send_replace(count);
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn save(&self, user_id: Option<&str>, message: &Message) -> Result<(), HistoryError> {
        let mut records = self.records.write().await;
        let record = HistoryRecord {
            user_id: user_id.map(str::to_owned),
            message: message.clone(),
        };
        match records.iter_mut().find(|r| r.message.id() == message.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.push_unseen(&records);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Message>, HistoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.message.id() == id)
            .map(|r| r.message.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), HistoryError> {
        let mut records = self.records.write().await;
        records.retain(|r| r.message.id() != id);
        self.push_unseen(&records);
        Ok(())
    }

    async fn mark_seen(&self, id: &str) -> Result<(), HistoryError> {
        let mut records = self.records.write().await;
        if let Some(record) = records.iter_mut().find(|r| r.message.id() == id) {
            record.message = record.message.with_seen(true);
        }
        self.push_unseen(&records);
        Ok(())
    }

    async fn mark_all_seen(&self, user_id: Option<&str>) -> Result<(), HistoryError> {
        let mut records = self.records.write().await;
        for record in records.iter_mut() {
            let in_scope = match user_id {
                Some(uid) => record.user_id.as_deref() == Some(uid),
                None => true,
            };
            if in_scope && !record.message.seen() {
                record.message = record.message.with_seen(true);
            }
        }
        self.push_unseen(&records);
        Ok(())
    }

    async fn query_by_user(&self, user_id: Option<&str>) -> Result<Vec<Message>, HistoryError> {
        let records = self.records.read().await;
        let mut out: Vec<Message> = records
            .iter()
            .filter(|r| match user_id {
                Some(uid) => r.user_id.as_deref() == Some(uid),
                None => true,
            })
            .map(|r| r.message.clone())
            .collect();
        out.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(out)
    }

    fn unseen_count(&self) -> watch::Receiver<usize> {
        self.unseen.subscribe()
    }
}
