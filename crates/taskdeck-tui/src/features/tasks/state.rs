//! Task manager state.

use taskdeck_core::{ChannelStatus, RealtimeSubscription, Task, TaskId};

use crate::common::TextField;
use crate::state::MountId;

/// Which part of the task screen receives keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFocus {
    #[default]
    Title,
    Description,
    List,
}

impl TaskFocus {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            TaskFocus::Title => TaskFocus::Description,
            TaskFocus::Description => TaskFocus::List,
            TaskFocus::List => TaskFocus::Title,
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            TaskFocus::Title => TaskFocus::List,
            TaskFocus::Description => TaskFocus::Title,
            TaskFocus::List => TaskFocus::Description,
        }
    }
}

/// State of one mounted task screen.
///
/// Lives exactly as long as the screen. Dropping it drops the realtime
/// subscription, which closes the channel.
#[derive(Debug)]
pub struct TaskManagerState {
    pub mount: MountId,
    /// Email of the session owner; filters every read and stamps inserts.
    pub owner: String,
    /// Ordered by id ascending after each fetch; realtime inserts append.
    pub tasks: Vec<Task>,
    pub title: TextField,
    pub description: TextField,
    /// Task being edited; `None` means the form creates.
    pub editing: Option<TaskId>,
    pub message: Option<String>,
    /// A save is running; further submits are ignored until its refetch lands.
    pub in_flight: bool,
    pub selected: usize,
    pub focus: TaskFocus,
    pub channel_status: Option<ChannelStatus>,
    pub subscription: Option<RealtimeSubscription>,
}

impl TaskManagerState {
    pub fn new(mount: MountId, owner: impl Into<String>) -> Self {
        Self {
            mount,
            owner: owner.into(),
            tasks: Vec::new(),
            title: TextField::default(),
            description: TextField::default(),
            editing: None,
            message: None,
            in_flight: false,
            selected: 0,
            focus: TaskFocus::default(),
            channel_status: None,
            subscription: None,
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.tasks.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.tasks.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keeps the selection inside the list after it shrinks.
    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.tasks.len().saturating_sub(1));
    }

    pub fn clear_draft(&mut self) {
        self.title.clear();
        self.description.clear();
    }

    /// Label of the form's submit action.
    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            "Update Task"
        } else if self.in_flight {
            "Saving..."
        } else {
            "Add Task"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: TaskId::new(id),
            title: format!("task {id}"),
            description: String::new(),
            email: "a@b.com".into(),
        }
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut state = TaskManagerState::new(MountId::new(1), "a@b.com");
        state.select_next();
        assert_eq!(state.selected, 0);

        state.tasks = vec![task("1"), task("2")];
        state.select_next();
        state.select_next();
        assert_eq!(state.selected, 1);

        state.tasks.pop();
        state.clamp_selection();
        assert_eq!(state.selected, 0);
        state.select_prev();
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_submit_label() {
        let mut state = TaskManagerState::new(MountId::new(1), "a@b.com");
        assert_eq!(state.submit_label(), "Add Task");
        state.in_flight = true;
        assert_eq!(state.submit_label(), "Saving...");
        state.editing = Some(TaskId::new("5"));
        assert_eq!(state.submit_label(), "Update Task");
    }

    #[test]
    fn test_focus_cycles() {
        assert_eq!(TaskFocus::Title.next(), TaskFocus::Description);
        assert_eq!(TaskFocus::List.next(), TaskFocus::Title);
        assert_eq!(TaskFocus::Title.prev(), TaskFocus::List);
    }
}
