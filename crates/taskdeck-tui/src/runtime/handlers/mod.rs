//! Effect handlers for the TUI runtime.
//!
//! Handlers are pure async functions that call the backend and return a
//! `UiEvent`. They never touch state. The runtime spawns them with
//! `spawn_effect` and delivers the result through the inbox.
//!
//! ```ignore
//! // Handler: pure async, returns UiEvent
//! pub async fn fetch_tasks(backend: Arc<dyn Backend>, ...) -> UiEvent { ... }
//!
//! // Runtime: spawns and sends to inbox
//! self.spawn_effect(move || handlers::fetch_tasks(backend, ...));
//! ```

pub mod auth;
pub mod tasks;

pub use auth::*;
pub use tasks::*;

#[cfg(test)]
mod tests;
