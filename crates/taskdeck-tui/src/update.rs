//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use taskdeck_core::session::now_secs;
use taskdeck_core::{AuthChangeEvent, InsertFilter, Session};

use crate::auth_form::{self, AuthFormState};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, FetchReason, Screen};
use crate::tasks::{self, TaskFocus, TaskManagerState};

/// Effects to run once when the runtime starts.
pub fn init(_app: &mut AppState) -> Vec<UiEffect> {
    vec![UiEffect::LoadSession]
}

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => handle_tick(app, Instant::now(), now_secs()),
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::SessionLoaded(session) => {
            if app.session_checked {
                // An auth notification already settled the session.
                tracing::debug!("Ignoring late startup session");
                return vec![];
            }
            app.session_checked = true;
            apply_session(app, session)
        }
        UiEvent::AuthChanged(change) => {
            tracing::debug!(event = ?change.event, "Auth state changed");
            if change.event == AuthChangeEvent::TokenRefreshed {
                app.refresh.in_flight = false;
                app.refresh.failed_at = None;
            }
            app.session_checked = true;
            apply_session(app, change.session)
        }
        UiEvent::SessionRefreshed(result) => {
            app.refresh.in_flight = false;
            match result {
                Ok(()) => app.refresh.failed_at = None,
                Err(e) => {
                    tracing::warn!("Session refresh failed: {e}");
                    app.refresh.failed_at = Some(Instant::now());
                }
            }
            vec![]
        }
        UiEvent::SignOutFinished(result) => {
            if let Err(e) = result {
                tracing::error!("Sign out error: {e}");
            }
            vec![]
        }
        UiEvent::Auth(auth_event) => {
            if let Screen::Auth(form) = &mut app.screen {
                auth_form::handle_event(form, auth_event);
            } else {
                tracing::debug!("Dropping auth result for a closed form");
            }
            vec![]
        }
        UiEvent::Tasks { mount, event } => match &mut app.screen {
            Screen::Tasks(tasks) if tasks.mount == mount => tasks::handle_event(tasks, event),
            _ => {
                tracing::debug!(?mount, "Dropping result for an unmounted task screen");
                vec![]
            }
        },
    }
}

/// Replaces the held session and picks the matching screen.
///
/// - no session: the auth form (a fresh one if the task screen was shown)
/// - a session for the owner already shown: nothing changes
/// - any other session: a newly mounted task screen
pub fn apply_session(app: &mut AppState, session: Option<Session>) -> Vec<UiEffect> {
    let owner = session.as_ref().map(|s| s.email().to_string());
    app.session = session;

    match owner {
        None => {
            if matches!(app.screen, Screen::Tasks(_)) {
                tracing::info!("Session ended");
                app.screen = Screen::Auth(AuthFormState::default());
            }
            vec![]
        }
        Some(owner) => {
            if let Screen::Tasks(tasks) = &app.screen
                && tasks.owner == owner
            {
                return vec![];
            }
            mount_tasks(app, owner)
        }
    }
}

fn mount_tasks(app: &mut AppState, owner: String) -> Vec<UiEffect> {
    let mount = app.next_mount_id();
    tracing::info!(?mount, "Showing tasks");

    let tasks = TaskManagerState::new(mount, owner);
    let mut effects = vec![tasks::fetch(&tasks, FetchReason::Mount)];
    if app.realtime.enabled {
        let filter = InsertFilter {
            owner: app.realtime.owner_filter.then(|| tasks.owner.clone()),
        };
        effects.push(UiEffect::SubscribeInserts { mount, filter });
    }

    // Replacing a previous task screen drops its realtime subscription.
    app.screen = Screen::Tasks(tasks);
    effects
}

fn handle_tick(app: &mut AppState, now: Instant, now_secs: i64) -> Vec<UiEffect> {
    let Some(session) = &app.session else {
        return vec![];
    };
    if session.is_expired_at(now_secs) && app.refresh.can_start(now) {
        app.refresh.in_flight = true;
        return vec![UiEffect::RefreshSession];
    }
    vec![]
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Paste(text) => {
            handle_paste(app, &text);
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return vec![UiEffect::Quit];
    }

    match &mut app.screen {
        Screen::Auth(form) => auth_form::handle_key(form, key),
        Screen::Tasks(tasks) => tasks::handle_key(tasks, key),
    }
}

fn handle_paste(app: &mut AppState, text: &str) {
    match &mut app.screen {
        Screen::Auth(form) => form.focused_field_mut().paste(text),
        Screen::Tasks(tasks) => match tasks.focus {
            TaskFocus::Title => tasks.title.paste(text),
            TaskFocus::Description => tasks.description.paste(text),
            TaskFocus::List => {}
        },
    }
}
