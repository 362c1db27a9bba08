//! UI event types.
//!
//! Everything the reducer reacts to: terminal input, the periodic tick, and
//! results of effects delivered through the runtime inbox.

use crossterm::event::Event;
use taskdeck_core::{AuthChange, RealtimeMessage, RealtimeSubscription, Session, Task, TaskId};

use crate::state::{FetchReason, MountId, SaveMode};

#[derive(Debug)]
pub enum UiEvent {
    /// Periodic timer.
    Tick,

    /// Terminal input or resize.
    Terminal(Event),

    /// Result of the startup session fetch.
    SessionLoaded(Option<Session>),

    /// Auth state notification from the backend client.
    AuthChanged(AuthChange),

    /// Result of a background token refresh. Success also arrives as an
    /// `AuthChanged` notification.
    SessionRefreshed(Result<(), String>),

    /// Result of a sign-out request.
    SignOutFinished(Result<(), String>),

    /// Auth form results.
    Auth(AuthUiEvent),

    /// Task screen results, tagged with the screen they were issued for.
    Tasks { mount: MountId, event: TasksUiEvent },
}

#[derive(Debug)]
pub enum AuthUiEvent {
    SignUpFinished(Result<(), String>),
    SignInFinished(Result<(), String>),
}

#[derive(Debug)]
pub enum TasksUiEvent {
    Fetched {
        reason: FetchReason,
        result: Result<Vec<Task>, String>,
    },
    Saved {
        mode: SaveMode,
        result: Result<(), String>,
    },
    Deleted {
        id: TaskId,
        result: Result<(), String>,
    },
    /// The realtime channel was opened (or could not be).
    RealtimeOpened(Result<RealtimeSubscription, String>),
    /// Status or insert delivered by the realtime channel.
    Realtime(RealtimeMessage),
}
