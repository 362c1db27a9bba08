//! Application state composition.
//!
//! ```text
//! AppState
//! ├── session: Option<Session>   (sole routing signal)
//! ├── screen: Screen
//! │   ├── Auth(AuthFormState)      when session is None
//! │   └── Tasks(TaskManagerState)  when session is Some
//! ├── refresh: RefreshState       (background token refresh)
//! └── realtime: RealtimeConfig
//! ```
//!
//! The screen is only ever chosen by `update::apply_session`, so the two
//! views are mutually exclusive and always match the held session.

use std::time::{Duration, Instant};

use taskdeck_core::Session;
use taskdeck_core::config::RealtimeConfig;

use crate::auth_form::AuthFormState;
use crate::tasks::TaskManagerState;

/// Identifies one mounted task screen.
///
/// Results are tagged with the mount they were requested for; results for a
/// screen that has since been torn down are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountId(u64);

impl MountId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Why a task fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    Mount,
    Manual,
    /// Follows a save; its completion clears the in-flight flag.
    AfterSave,
    AfterDelete,
}

/// Which kind of save produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Create,
    Update,
}

/// The view shown for the current session.
#[derive(Debug)]
pub enum Screen {
    Auth(AuthFormState),
    Tasks(TaskManagerState),
}

impl Default for Screen {
    fn default() -> Self {
        Screen::Auth(AuthFormState::default())
    }
}

/// Wait before retrying a failed token refresh.
pub const REFRESH_RETRY: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
pub struct RefreshState {
    pub in_flight: bool,
    pub failed_at: Option<Instant>,
}

impl RefreshState {
    /// True if a refresh may be started now.
    pub fn can_start(&self, now: Instant) -> bool {
        !self.in_flight
            && self
                .failed_at
                .is_none_or(|at| now.duration_since(at) >= REFRESH_RETRY)
    }
}

#[derive(Debug)]
pub struct AppState {
    pub should_quit: bool,
    pub session: Option<Session>,
    /// The startup session fetch has completed.
    pub session_checked: bool,
    pub screen: Screen,
    pub refresh: RefreshState,
    pub realtime: RealtimeConfig,
    next_mount: u64,
}

impl AppState {
    pub fn new(realtime: RealtimeConfig) -> Self {
        Self {
            should_quit: false,
            session: None,
            session_checked: false,
            screen: Screen::default(),
            refresh: RefreshState::default(),
            realtime,
            next_mount: 1,
        }
    }

    /// Allocates the id for a newly mounted task screen.
    pub fn next_mount_id(&mut self) -> MountId {
        let id = MountId(self.next_mount);
        self.next_mount += 1;
        id
    }

    pub fn tasks(&self) -> Option<&TaskManagerState> {
        match &self.screen {
            Screen::Tasks(tasks) => Some(tasks),
            Screen::Auth(_) => None,
        }
    }

    pub fn auth_form(&self) -> Option<&AuthFormState> {
        match &self.screen {
            Screen::Auth(form) => Some(form),
            Screen::Tasks(_) => None,
        }
    }
}
