//! Session and auth form handlers.

use std::sync::Arc;

use taskdeck_core::{AuthSubscription, Backend};
use tokio_util::sync::CancellationToken;

use crate::events::{AuthUiEvent, UiEvent};
use crate::runtime::inbox::UiEventSender;

/// Fetches the persisted session at startup.
pub async fn load_session(backend: Arc<dyn Backend>) -> UiEvent {
    UiEvent::SessionLoaded(backend.current_session().await)
}

pub async fn sign_up(backend: Arc<dyn Backend>, email: String, password: String) -> UiEvent {
    let result = match backend.sign_up(&email, &password).await {
        Ok(outcome) => {
            tracing::info!(?outcome, "Signed up");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    };
    UiEvent::Auth(AuthUiEvent::SignUpFinished(result))
}

pub async fn sign_in(backend: Arc<dyn Backend>, email: String, password: String) -> UiEvent {
    let result = backend
        .sign_in(&email, &password)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string());
    UiEvent::Auth(AuthUiEvent::SignInFinished(result))
}

pub async fn sign_out(backend: Arc<dyn Backend>) -> UiEvent {
    UiEvent::SignOutFinished(backend.sign_out().await.map_err(|e| e.to_string()))
}

pub async fn refresh_session(backend: Arc<dyn Backend>) -> UiEvent {
    let result = backend
        .refresh_session()
        .await
        .map(|_| ())
        .map_err(|e| e.to_string());
    UiEvent::SessionRefreshed(result)
}

/// Forwards auth notifications into the inbox until cancelled.
///
/// Dropping the subscription on exit unregisters the listener.
pub async fn forward_auth_changes(
    mut subscription: AuthSubscription,
    inbox: UiEventSender,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            change = subscription.recv() => {
                let Some(change) = change else { break };
                if inbox.send(UiEvent::AuthChanged(change)).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Auth listener stopped");
}
