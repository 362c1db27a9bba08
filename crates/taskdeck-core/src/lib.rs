//! Core taskdeck library (config, logging, data model, backend client).

pub mod auth_events;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod session;
pub mod supabase;

pub use auth_events::{AuthChange, AuthChangeEvent, AuthEvents, AuthSubscription};
pub use backend::{
    Backend, BackendResult, ChannelStatus, InsertFilter, RealtimeMessage, RealtimeReceiver,
    RealtimeSubscription, SignUpOutcome,
};
pub use error::BackendError;
pub use model::{NewTask, Task, TaskId, TaskPatch};
pub use session::{Session, SessionStore, User};
pub use supabase::SupabaseClient;
