//! Task screen handlers.
//!
//! Every result is tagged with the mount it was issued for.

use std::sync::Arc;

use taskdeck_core::{Backend, InsertFilter, NewTask, RealtimeReceiver, TaskId, TaskPatch};

use crate::events::{TasksUiEvent, UiEvent};
use crate::runtime::inbox::UiEventSender;
use crate::state::{FetchReason, MountId, SaveMode};

pub async fn fetch_tasks(
    backend: Arc<dyn Backend>,
    mount: MountId,
    owner: String,
    reason: FetchReason,
) -> UiEvent {
    let result = backend.list_tasks(&owner).await.map_err(|e| e.to_string());
    UiEvent::Tasks {
        mount,
        event: TasksUiEvent::Fetched { reason, result },
    }
}

pub async fn insert_task(backend: Arc<dyn Backend>, mount: MountId, task: NewTask) -> UiEvent {
    let result = backend.insert_task(&task).await.map_err(|e| e.to_string());
    UiEvent::Tasks {
        mount,
        event: TasksUiEvent::Saved {
            mode: SaveMode::Create,
            result,
        },
    }
}

pub async fn update_task(
    backend: Arc<dyn Backend>,
    mount: MountId,
    id: TaskId,
    patch: TaskPatch,
) -> UiEvent {
    let result = backend
        .update_task(&id, &patch)
        .await
        .map_err(|e| e.to_string());
    UiEvent::Tasks {
        mount,
        event: TasksUiEvent::Saved {
            mode: SaveMode::Update,
            result,
        },
    }
}

pub async fn delete_task(backend: Arc<dyn Backend>, mount: MountId, id: TaskId) -> UiEvent {
    let result = backend.delete_task(&id).await.map_err(|e| e.to_string());
    UiEvent::Tasks {
        mount,
        event: TasksUiEvent::Deleted { id, result },
    }
}

/// Opens the insert channel and starts forwarding its messages.
///
/// The returned event hands the subscription to the task screen; once that
/// screen drops it, the channel closes and the forwarder ends.
pub async fn subscribe_inserts(
    backend: Arc<dyn Backend>,
    mount: MountId,
    filter: InsertFilter,
    inbox: UiEventSender,
) -> UiEvent {
    let result = match backend.subscribe_inserts(filter).await {
        Ok((subscription, rx)) => {
            tokio::spawn(forward_realtime(mount, rx, inbox));
            Ok(subscription)
        }
        Err(e) => Err(e.to_string()),
    };
    UiEvent::Tasks {
        mount,
        event: TasksUiEvent::RealtimeOpened(result),
    }
}

async fn forward_realtime(mount: MountId, mut rx: RealtimeReceiver, inbox: UiEventSender) {
    while let Some(message) = rx.recv().await {
        let event = UiEvent::Tasks {
            mount,
            event: TasksUiEvent::Realtime(message),
        };
        if inbox.send(event).is_err() {
            break;
        }
    }
    tracing::debug!(?mount, "Realtime forwarder stopped");
}
