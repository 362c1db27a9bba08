//! Task manager: create/edit form, owner-filtered list, realtime inserts.

mod render;
mod state;
mod update;

pub use render::{EMPTY_LIST, render_task_manager};
pub use state::{TaskFocus, TaskManagerState};
pub use update::{
    EDITING, INSERT_FAILED, TASK_ADDED, TASK_UPDATED, TITLE_REQUIRED, UPDATE_FAILED,
    begin_edit, delete_selected, fetch, handle_event, handle_key, submit,
};
