//! Remote service boundary.
//!
//! The UI talks to the hosted backend only through [`Backend`]. The Supabase
//! implementation lives in [`crate::supabase`]; tests substitute their own.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth_events::AuthSubscription;
use crate::error::BackendError;
use crate::model::{NewTask, Task, TaskId, TaskPatch};
use crate::session::Session;

pub type BackendResult<T> = Result<T, BackendError>;

/// Result of a successful sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account must be confirmed by email before it can sign in.
    ConfirmationRequired,
    /// The service issued a session right away (confirmation disabled).
    SignedIn,
}

/// Connection status reported by a realtime channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatus {
    Subscribed,
    ChannelError(String),
    TimedOut,
    Closed,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelStatus::Subscribed => f.write_str("SUBSCRIBED"),
            ChannelStatus::ChannelError(reason) if reason.is_empty() => {
                f.write_str("CHANNEL_ERROR")
            }
            ChannelStatus::ChannelError(reason) => write!(f, "CHANNEL_ERROR ({reason})"),
            ChannelStatus::TimedOut => f.write_str("TIMED_OUT"),
            ChannelStatus::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Message delivered on a realtime subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeMessage {
    Status(ChannelStatus),
    Insert(Task),
}

pub type RealtimeReceiver = mpsc::UnboundedReceiver<RealtimeMessage>;

/// Which inserts a subscription asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertFilter {
    /// When set, only rows whose `email` equals this value are delivered.
    pub owner: Option<String>,
}

/// Scoped handle for an open realtime channel.
///
/// The channel stays open while the handle lives. Dropping or closing it
/// cancels the socket task, which leaves the channel and closes the socket.
pub struct RealtimeSubscription {
    topic: String,
    cancel: CancellationToken,
}

impl RealtimeSubscription {
    pub fn new(topic: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            topic: topic.into(),
            cancel,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(topic = %self.topic, "closing realtime subscription");
            self.cancel.cancel();
        }
    }
}

impl fmt::Debug for RealtimeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeSubscription")
            .field("topic", &self.topic)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Auth, data and realtime operations of the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Creates an account with email and password.
    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<SignUpOutcome>;

    /// Authenticates with email and password, persisting the session and
    /// notifying auth listeners.
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// Ends the current session and notifies auth listeners.
    async fn sign_out(&self) -> BackendResult<()>;

    /// Returns the persisted session, refreshing it first if it has expired.
    async fn current_session(&self) -> Option<Session>;

    /// Exchanges the refresh token for a new session.
    async fn refresh_session(&self) -> BackendResult<Session>;

    /// Registers an auth state-change listener.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// Tasks owned by `owner`, ordered by id ascending.
    async fn list_tasks(&self, owner: &str) -> BackendResult<Vec<Task>>;

    async fn insert_task(&self, task: &NewTask) -> BackendResult<()>;

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> BackendResult<()>;

    async fn delete_task(&self, id: &TaskId) -> BackendResult<()>;

    /// Opens a realtime channel for task inserts.
    async fn subscribe_inserts(
        &self,
        filter: InsertFilter,
    ) -> BackendResult<(RealtimeSubscription, RealtimeReceiver)>;
}
