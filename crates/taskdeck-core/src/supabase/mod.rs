//! Supabase client for the GoTrue, PostgREST and Realtime APIs.
//!
//! `SupabaseClient` keeps the current session in memory, mirrors it to the
//! [`SessionStore`], and attaches its access token to every request (falling
//! back to the anon key when signed out).

mod auth;
mod realtime;
mod rest;

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::watch;

use crate::auth_events::{AuthEvents, AuthSubscription};
use crate::backend::{
    Backend, BackendResult, InsertFilter, RealtimeReceiver, RealtimeSubscription, SignUpOutcome,
};
use crate::config::{self, Config, RealtimeConfig};
use crate::error::BackendError;
use crate::model::{NewTask, Task, TaskId, TaskPatch};
use crate::session::{Session, SessionStore};

/// Supabase client for auth, task rows and realtime inserts.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    url: String,
    anon_key: String,
    table: String,
    realtime: RealtimeConfig,
    store: SessionStore,
    session: Arc<Mutex<Option<Session>>>,
    /// Current bearer token, watched by open realtime channels.
    token: Arc<watch::Sender<String>>,
    events: AuthEvents,
}

impl SupabaseClient {
    /// Creates a client with default settings and the default session store.
    pub fn new(url: &str, anon_key: &str) -> Self {
        let anon_key = anon_key.trim().to_string();
        let (token, _) = watch::channel(anon_key.clone());
        Self {
            http: Client::new(),
            url: url.trim().trim_end_matches('/').to_string(),
            anon_key,
            table: config::TasksConfig::default().table,
            realtime: RealtimeConfig::default(),
            store: SessionStore::default(),
            session: Arc::new(Mutex::new(None)),
            token: Arc::new(token),
            events: AuthEvents::new(),
        }
    }

    /// Builds a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the backend URL or anon key is missing, or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let config_path = config::paths::config_path();
        let url = config.backend.effective_url().with_context(|| {
            format!(
                "Backend URL is not configured. Set backend.url in {} or {}",
                config_path.display(),
                config::URL_ENV_VAR
            )
        })?;
        let anon_key = config.backend.effective_anon_key().with_context(|| {
            format!(
                "Backend anon key is not configured. Set backend.anon_key in {} or {}",
                config_path.display(),
                config::ANON_KEY_ENV_VAR
            )
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.backend.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        let mut client = Self::new(&url, &anon_key)
            .with_table(&config.tasks.table)
            .with_realtime(config.realtime.clone());
        client.http = http;
        Ok(client)
    }

    #[must_use]
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.trim().to_string();
        self
    }

    #[must_use]
    pub fn with_realtime(mut self, realtime: RealtimeConfig) -> Self {
        self.realtime = realtime;
        self
    }

    /// Listener registry shared by every clone of this client.
    pub fn auth_events(&self) -> &AuthEvents {
        &self.events
    }

    fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url)
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    /// Session currently held in memory.
    fn held_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bearer token: the session's access token, or the anon key.
    fn bearer(&self) -> String {
        self.held_session()
            .map_or_else(|| self.anon_key.clone(), |s| s.access_token)
    }

    /// Replaces the held session and mirrors it to disk.
    ///
    /// Storage failures are logged; the in-memory session still changes.
    fn set_session(&self, session: Option<Session>) {
        let result = match &session {
            Some(s) => self.store.save(s),
            None => self.store.clear(),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to persist session: {e:#}");
        }
        self.hold(session);
    }

    /// Replaces the held session without touching disk.
    fn hold(&self, session: Option<Session>) {
        let token = session
            .as_ref()
            .map_or_else(|| self.anon_key.clone(), |s| s.access_token.clone());
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
        self.token.send_replace(token);
    }

    /// Loads the persisted session into memory if nothing is held yet.
    fn restore_session(&self) -> Option<Session> {
        if let Some(session) = self.held_session() {
            return Some(session);
        }
        match self.store.load() {
            Ok(Some(session)) => {
                self.hold(Some(session.clone()));
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable session: {e:#}");
                None
            }
        }
    }
}

/// Maps a non-success response to [`BackendError::Api`].
async fn check_status(resp: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BackendError::from_response(status.as_u16(), &body))
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<SignUpOutcome> {
        self.sign_up_with_password(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.sign_in_with_password(email, password).await
    }

    async fn sign_out(&self) -> BackendResult<()> {
        self.sign_out_session().await
    }

    async fn current_session(&self) -> Option<Session> {
        let session = self.restore_session()?;
        if !session.is_expired() {
            return Some(session);
        }
        match self.refresh().await {
            Ok(session) => Some(session),
            Err(e) if e.is_auth_rejection() => {
                tracing::info!("Persisted session could not be refreshed: {e}");
                self.set_session(None);
                None
            }
            // Keep the file so a later start can retry.
            Err(e) => {
                tracing::warn!("Session refresh failed, keeping saved session: {e}");
                self.hold(None);
                None
            }
        }
    }

    async fn refresh_session(&self) -> BackendResult<Session> {
        self.refresh().await
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.events.subscribe()
    }

    async fn list_tasks(&self, owner: &str) -> BackendResult<Vec<Task>> {
        self.select_tasks(owner).await
    }

    async fn insert_task(&self, task: &NewTask) -> BackendResult<()> {
        self.insert_rows(task).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> BackendResult<()> {
        self.patch_row(id, patch).await
    }

    async fn delete_task(&self, id: &TaskId) -> BackendResult<()> {
        self.delete_row(id).await
    }

    async fn subscribe_inserts(
        &self,
        filter: InsertFilter,
    ) -> BackendResult<(RealtimeSubscription, RealtimeReceiver)> {
        self.open_insert_channel(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_trim_trailing_slash() {
        let client = SupabaseClient::new("https://abc.supabase.co/ ", "anon");
        assert_eq!(client.auth_url(), "https://abc.supabase.co/auth/v1");
        assert_eq!(client.rest_url(), "https://abc.supabase.co/rest/v1/tasks");
    }

    #[test]
    fn test_bearer_falls_back_to_anon_key() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon");
        assert_eq!(client.bearer(), "anon");
    }

    #[test]
    fn test_from_config_requires_url_and_key() {
        let mut config = Config::default();
        config.backend.url = Some("https://abc.supabase.co".into());
        config.backend.anon_key = Some("anon".into());
        config.tasks.table = "todo_items".into();

        let client = SupabaseClient::from_config(&config).unwrap();
        assert_eq!(client.rest_url(), "https://abc.supabase.co/rest/v1/todo_items");
    }
}
