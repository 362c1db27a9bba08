//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent remote calls and task spawning only, never direct state
//! changes, so the reducer stays pure.

use taskdeck_core::{InsertFilter, NewTask, TaskId, TaskPatch};

use crate::state::{FetchReason, MountId};

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Fetch the persisted session once at startup.
    LoadSession,

    /// Create an account.
    SignUp { email: String, password: String },

    /// Authenticate with email and password.
    SignIn { email: String, password: String },

    /// End the current session.
    SignOut,

    /// Exchange the refresh token before the access token expires.
    RefreshSession,

    /// Load the owner's tasks for the task screen identified by `mount`.
    FetchTasks {
        mount: MountId,
        owner: String,
        reason: FetchReason,
    },

    InsertTask { mount: MountId, task: NewTask },

    UpdateTask {
        mount: MountId,
        id: TaskId,
        patch: TaskPatch,
    },

    DeleteTask { mount: MountId, id: TaskId },

    /// Open the realtime insert channel for the task screen.
    SubscribeInserts { mount: MountId, filter: InsertFilter },
}
