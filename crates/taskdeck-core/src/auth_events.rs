//! Authentication state-change notifications.
//!
//! The client emits an [`AuthChange`] on every sign-in, sign-out and token
//! refresh. Listeners register through [`AuthEvents::subscribe`] and receive
//! changes on their own channel until they unsubscribe (explicitly or on drop).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::session::Session;

/// Kind of authentication transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A transition plus the session that is current after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            event: AuthChangeEvent::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            event: AuthChangeEvent::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            event: AuthChangeEvent::TokenRefreshed,
            session: Some(session),
        }
    }
}

#[derive(Debug, Default)]
struct Listeners {
    next_id: u64,
    senders: HashMap<u64, mpsc::UnboundedSender<AuthChange>>,
}

/// Listener registry for auth changes. Cheap to clone; clones share listeners.
#[derive(Debug, Clone, Default)]
pub struct AuthEvents {
    inner: Arc<Mutex<Listeners>>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new listener.
    pub fn subscribe(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id = listeners.next_id.wrapping_add(1);
        listeners.senders.insert(id, tx);
        AuthSubscription {
            id,
            events: self.clone(),
            rx,
        }
    }

    /// Delivers a change to every registered listener.
    ///
    /// Listeners whose receiving side is gone are pruned.
    pub fn emit(&self, change: &AuthChange) {
        let mut listeners = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        listeners
            .senders
            .retain(|_, tx| tx.send(change.clone()).is_ok());
        tracing::debug!(
            event = ?change.event,
            listeners = listeners.senders.len(),
            "auth state change"
        );
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .len()
    }

    fn remove(&self, id: u64) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .remove(&id);
    }
}

/// Handle for one auth listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct AuthSubscription {
    id: u64,
    events: AuthEvents,
    rx: mpsc::UnboundedReceiver<AuthChange>,
}

impl AuthSubscription {
    /// Waits for the next change. Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        self.rx.recv().await
    }

    /// Returns a pending change without waiting.
    pub fn try_recv(&mut self) -> Option<AuthChange> {
        self.rx.try_recv().ok()
    }

    /// Stops receiving changes.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.events.remove(self.id);
    }
}
