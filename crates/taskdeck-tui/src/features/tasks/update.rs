//! Task manager reducer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use taskdeck_core::{ChannelStatus, NewTask, RealtimeMessage, TaskPatch};

use super::state::{TaskFocus, TaskManagerState};
use crate::effects::UiEffect;
use crate::events::TasksUiEvent;
use crate::state::{FetchReason, SaveMode};

pub const TITLE_REQUIRED: &str = "Title is required.";
pub const TASK_UPDATED: &str = "Task updated!";
pub const UPDATE_FAILED: &str = "Update failed.";
pub const TASK_ADDED: &str = "Task added!";
pub const INSERT_FAILED: &str = "Insert failed.";
pub const EDITING: &str = "Editing task...";

/// Effect that reloads the owner's tasks.
pub fn fetch(state: &TaskManagerState, reason: FetchReason) -> UiEffect {
    UiEffect::FetchTasks {
        mount: state.mount,
        owner: state.owner.clone(),
        reason,
    }
}

/// Handles a key while the task screen is shown.
pub fn handle_key(state: &mut TaskManagerState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('l') if ctrl => return vec![UiEffect::SignOut],
        KeyCode::Char('r') if ctrl => return vec![fetch(state, FetchReason::Manual)],
        KeyCode::Tab => {
            state.focus = state.focus.next();
            return vec![];
        }
        KeyCode::BackTab => {
            state.focus = state.focus.prev();
            return vec![];
        }
        _ => {}
    }

    match state.focus {
        TaskFocus::Title | TaskFocus::Description => {
            if key.code == KeyCode::Enter {
                return submit(state);
            }
            let field = if state.focus == TaskFocus::Title {
                &mut state.title
            } else {
                &mut state.description
            };
            field.handle_key(key);
            vec![]
        }
        TaskFocus::List => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.select_prev();
                vec![]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.select_next();
                vec![]
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                begin_edit(state);
                vec![]
            }
            KeyCode::Char('d') | KeyCode::Delete => delete_selected(state),
            _ => vec![],
        },
    }
}

/// Saves the draft: an update when editing, an insert otherwise.
pub fn submit(state: &mut TaskManagerState) -> Vec<UiEffect> {
    if state.in_flight {
        return vec![];
    }
    if state.title.value().trim().is_empty() {
        state.message = Some(TITLE_REQUIRED.to_string());
        return vec![];
    }

    state.in_flight = true;
    let title = state.title.value().to_string();
    let description = state.description.value().to_string();
    match &state.editing {
        Some(id) => vec![UiEffect::UpdateTask {
            mount: state.mount,
            id: id.clone(),
            patch: TaskPatch { title, description },
        }],
        None => vec![UiEffect::InsertTask {
            mount: state.mount,
            task: NewTask {
                title,
                description,
                email: state.owner.clone(),
            },
        }],
    }
}

/// Loads the selected task into the form and marks it as the edit target.
pub fn begin_edit(state: &mut TaskManagerState) {
    let Some(task) = state.selected_task().cloned() else {
        return;
    };
    state.title.set(task.title);
    state.description.set(task.description);
    state.editing = Some(task.id);
    state.message = Some(EDITING.to_string());
    state.focus = TaskFocus::Title;
}

pub fn delete_selected(state: &TaskManagerState) -> Vec<UiEffect> {
    state
        .selected_task()
        .map(|task| UiEffect::DeleteTask {
            mount: state.mount,
            id: task.id.clone(),
        })
        .into_iter()
        .collect()
}

/// Applies a result addressed to this screen.
pub fn handle_event(state: &mut TaskManagerState, event: TasksUiEvent) -> Vec<UiEffect> {
    match event {
        TasksUiEvent::Fetched { reason, result } => {
            match result {
                Ok(tasks) => {
                    state.tasks = tasks;
                    state.clamp_selection();
                }
                Err(e) => tracing::error!("Fetch error: {e}"),
            }
            if reason == FetchReason::AfterSave {
                state.in_flight = false;
            }
            vec![]
        }
        TasksUiEvent::Saved { mode, result } => {
            let message = match (mode, result) {
                (SaveMode::Update, Ok(())) => {
                    state.editing = None;
                    TASK_UPDATED
                }
                (SaveMode::Update, Err(e)) => {
                    tracing::error!("Update error: {e}");
                    UPDATE_FAILED
                }
                (SaveMode::Create, Ok(())) => TASK_ADDED,
                (SaveMode::Create, Err(e)) => {
                    tracing::error!("Insert error: {e}");
                    INSERT_FAILED
                }
            };
            state.message = Some(message.to_string());
            state.clear_draft();
            vec![fetch(state, FetchReason::AfterSave)]
        }
        TasksUiEvent::Deleted { id, result } => match result {
            Ok(()) => {
                tracing::debug!(%id, "Task deleted");
                vec![fetch(state, FetchReason::AfterDelete)]
            }
            Err(e) => {
                tracing::error!("Delete error: {e}");
                vec![]
            }
        },
        TasksUiEvent::RealtimeOpened(Ok(subscription)) => {
            state.subscription = Some(subscription);
            vec![]
        }
        TasksUiEvent::RealtimeOpened(Err(e)) => {
            let status = ChannelStatus::ChannelError(e);
            tracing::warn!("Subscription: {status}");
            state.channel_status = Some(status);
            vec![]
        }
        TasksUiEvent::Realtime(RealtimeMessage::Status(status)) => {
            tracing::info!("Subscription: {status}");
            state.channel_status = Some(status);
            vec![]
        }
        TasksUiEvent::Realtime(RealtimeMessage::Insert(task)) => {
            state.tasks.push(task);
            vec![]
        }
    }
}
