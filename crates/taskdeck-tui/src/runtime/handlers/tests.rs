//! End-to-end flows through the reducer and the effect handlers against an
//! in-memory backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use taskdeck_core::config::RealtimeConfig;
use taskdeck_core::session::now_secs;
use taskdeck_core::{
    AuthChange, AuthEvents, AuthSubscription, Backend, BackendError, BackendResult,
    ChannelStatus, InsertFilter, NewTask, RealtimeMessage, RealtimeReceiver,
    RealtimeSubscription, Session, SignUpOutcome, Task, TaskId, TaskPatch, User,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::auth_form::{CONFIRM_EMAIL, SIGNED_IN};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::runtime::inbox::{UiEventReceiver, UiEventSender};
use crate::state::AppState;
use crate::tasks::{TASK_ADDED, TASK_UPDATED};
use crate::update;

const PASSWORD: &str = "secret";

fn session_for(email: &str) -> Session {
    Session {
        access_token: format!("token-{email}"),
        refresh_token: "refresh".into(),
        token_type: Some("bearer".into()),
        expires_in: Some(3600),
        expires_at: Some(now_secs() + 3600),
        user: User {
            id: format!("id-{email}"),
            email: Some(email.into()),
        },
    }
}

fn task(id: &str, title: &str, email: &str) -> Task {
    Task {
        id: TaskId::new(id),
        title: title.into(),
        description: String::new(),
        email: email.into(),
    }
}

#[derive(Default)]
struct FakeBackend {
    events: AuthEvents,
    session: Mutex<Option<Session>>,
    tasks: Mutex<Vec<Task>>,
    next_id: Mutex<u64>,
    calls: Mutex<Vec<String>>,
    realtime: Mutex<Option<mpsc::UnboundedSender<RealtimeMessage>>>,
    channels: Mutex<Vec<(InsertFilter, CancellationToken)>>,
}

impl FakeBackend {
    fn with_tasks(tasks: Vec<Task>) -> Self {
        let next = tasks
            .iter()
            .filter_map(|t| t.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let backend = Self::default();
        *backend.tasks.lock().unwrap() = tasks;
        *backend.next_id.lock().unwrap() = next + 1;
        backend
    }

    fn signed_in(self, email: &str) -> Self {
        *self.session.lock().unwrap() = Some(session_for(email));
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push_realtime(&self, message: RealtimeMessage) {
        if let Some(tx) = self.realtime.lock().unwrap().as_ref() {
            tx.send(message).unwrap();
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn sign_up(&self, email: &str, _password: &str) -> BackendResult<SignUpOutcome> {
        self.record(format!("sign_up {email}"));
        Ok(SignUpOutcome::ConfirmationRequired)
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.record(format!("sign_in {email}"));
        if password != PASSWORD {
            return Err(BackendError::Api {
                status: 400,
                message: "Invalid login credentials".into(),
            });
        }
        let session = session_for(email);
        *self.session.lock().unwrap() = Some(session.clone());
        self.events.emit(&AuthChange::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        self.record("sign_out".into());
        *self.session.lock().unwrap() = None;
        self.events.emit(&AuthChange::signed_out());
        Ok(())
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    async fn refresh_session(&self) -> BackendResult<Session> {
        let session = self
            .session
            .lock()
            .unwrap()
            .clone()
            .ok_or(BackendError::NotSignedIn)?;
        self.events.emit(&AuthChange::token_refreshed(session.clone()));
        Ok(session)
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.events.subscribe()
    }

    async fn list_tasks(&self, owner: &str) -> BackendResult<Vec<Task>> {
        self.record(format!("list {owner}"));
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.email == owner)
            .cloned()
            .collect())
    }

    async fn insert_task(&self, new: &NewTask) -> BackendResult<()> {
        self.record(format!("insert {}", new.title));
        let mut next_id = self.next_id.lock().unwrap();
        let id = next_id.to_string();
        *next_id += 1;
        self.tasks.lock().unwrap().push(Task {
            id: TaskId::new(id),
            title: new.title.clone(),
            description: new.description.clone(),
            email: new.email.clone(),
        });
        Ok(())
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> BackendResult<()> {
        self.record(format!("update {id}"));
        for task in self.tasks.lock().unwrap().iter_mut() {
            if &task.id == id {
                task.title = patch.title.clone();
                task.description = patch.description.clone();
            }
        }
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> BackendResult<()> {
        self.record(format!("delete {id}"));
        self.tasks.lock().unwrap().retain(|t| &t.id != id);
        Ok(())
    }

    async fn subscribe_inserts(
        &self,
        filter: InsertFilter,
    ) -> BackendResult<(RealtimeSubscription, RealtimeReceiver)> {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(RealtimeMessage::Status(ChannelStatus::Subscribed))
            .unwrap();
        *self.realtime.lock().unwrap() = Some(tx);
        let cancel = CancellationToken::new();
        self.channels
            .lock()
            .unwrap()
            .push((filter, cancel.clone()));
        Ok((
            RealtimeSubscription::new("realtime:tasks-channel", cancel),
            rx,
        ))
    }
}

/// Plays the runtime's role without a terminal: executes effects, feeds
/// results back through the reducer, and drains notifications.
struct Harness {
    app: AppState,
    backend: Arc<FakeBackend>,
    auth: AuthSubscription,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
}

impl Harness {
    async fn start(backend: FakeBackend) -> Self {
        let backend = Arc::new(backend);
        let auth = backend.on_auth_state_change();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let mut harness = Self {
            app: AppState::new(RealtimeConfig::default()),
            backend,
            auth,
            inbox_tx,
            inbox_rx,
        };
        let effects = update::init(&mut harness.app);
        harness.settle(effects).await;
        harness
    }

    async fn execute(&mut self, effect: UiEffect) -> Option<UiEvent> {
        let backend: Arc<dyn Backend> = Arc::<FakeBackend>::clone(&self.backend);
        let event = match effect {
            UiEffect::Quit => {
                self.app.should_quit = true;
                return None;
            }
            UiEffect::LoadSession => load_session(backend).await,
            UiEffect::SignUp { email, password } => sign_up(backend, email, password).await,
            UiEffect::SignIn { email, password } => sign_in(backend, email, password).await,
            UiEffect::SignOut => sign_out(backend).await,
            UiEffect::RefreshSession => refresh_session(backend).await,
            UiEffect::FetchTasks {
                mount,
                owner,
                reason,
            } => fetch_tasks(backend, mount, owner, reason).await,
            UiEffect::InsertTask { mount, task } => insert_task(backend, mount, task).await,
            UiEffect::UpdateTask { mount, id, patch } => {
                update_task(backend, mount, id, patch).await
            }
            UiEffect::DeleteTask { mount, id } => delete_task(backend, mount, id).await,
            UiEffect::SubscribeInserts { mount, filter } => {
                subscribe_inserts(backend, mount, filter, self.inbox_tx.clone()).await
            }
        };
        Some(event)
    }

    async fn settle(&mut self, effects: Vec<UiEffect>) {
        let mut queue: VecDeque<UiEffect> = effects.into();
        loop {
            while let Some(effect) = queue.pop_front() {
                if let Some(event) = self.execute(effect).await {
                    queue.extend(update::update(&mut self.app, event));
                }
            }
            // Let spawned forwarders run.
            tokio::task::yield_now().await;
            while let Some(change) = self.auth.try_recv() {
                queue.extend(update::update(&mut self.app, UiEvent::AuthChanged(change)));
            }
            while let Ok(event) = self.inbox_rx.try_recv() {
                queue.extend(update::update(&mut self.app, event));
            }
            if queue.is_empty() {
                break;
            }
        }
    }

    async fn press(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let event = UiEvent::Terminal(Event::Key(KeyEvent::new(code, modifiers)));
        let effects = update::update(&mut self.app, event);
        self.settle(effects).await;
    }

    async fn key(&mut self, code: KeyCode) {
        self.press(code, KeyModifiers::NONE).await;
    }

    async fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.key(KeyCode::Char(c)).await;
        }
    }

    /// Waits for the next forwarded event and applies it.
    async fn next_inbox_event(&mut self) {
        let event = tokio::time::timeout(Duration::from_secs(1), self.inbox_rx.recv())
            .await
            .expect("inbox event")
            .expect("inbox open");
        let effects = update::update(&mut self.app, event);
        self.settle(effects).await;
    }

    fn titles(&self) -> Vec<String> {
        self.app
            .tasks()
            .expect("task screen")
            .tasks
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }
}

async fn fill_credentials(h: &mut Harness, email: &str, password: &str) {
    h.type_text(email).await;
    h.key(KeyCode::Tab).await;
    h.type_text(password).await;
}

#[tokio::test]
async fn test_startup_without_session_shows_auth_form() {
    let h = Harness::start(FakeBackend::default()).await;

    assert!(h.app.session_checked);
    assert!(h.app.auth_form().is_some());
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_sign_up_stays_on_auth_form() {
    let mut h = Harness::start(FakeBackend::default()).await;

    fill_credentials(&mut h, "a@b.com", PASSWORD).await;
    h.key(KeyCode::Enter).await;

    let form = h.app.auth_form().expect("auth form");
    assert_eq!(form.message.as_deref(), Some(CONFIRM_EMAIL));
    assert_eq!(h.backend.calls(), vec!["sign_up a@b.com"]);
    assert!(h.app.session.is_none());
}

#[tokio::test]
async fn test_sign_in_shows_only_owner_tasks() {
    let backend = FakeBackend::with_tasks(vec![
        task("1", "Mine", "a@b.com"),
        task("2", "Theirs", "c@d.com"),
    ]);
    let mut h = Harness::start(backend).await;

    h.press(KeyCode::Char('t'), KeyModifiers::CONTROL).await;
    fill_credentials(&mut h, "a@b.com", PASSWORD).await;
    h.key(KeyCode::Enter).await;

    assert_eq!(h.titles(), vec!["Mine"]);
    let tasks = h.app.tasks().unwrap();
    assert_eq!(tasks.owner, "a@b.com");
    assert!(tasks.subscription.is_some());
    assert_eq!(tasks.channel_status, Some(ChannelStatus::Subscribed));

    let channels = h.backend.channels.lock().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].0, InsertFilter::default());
}

#[tokio::test]
async fn test_failed_sign_in_shows_service_message() {
    let mut h = Harness::start(FakeBackend::default()).await;

    h.press(KeyCode::Char('t'), KeyModifiers::CONTROL).await;
    fill_credentials(&mut h, "a@b.com", "nope").await;
    h.key(KeyCode::Enter).await;

    let form = h.app.auth_form().expect("auth form");
    assert_eq!(form.message.as_deref(), Some("Invalid login credentials"));
    assert_ne!(form.message.as_deref(), Some(SIGNED_IN));
}

#[tokio::test]
async fn test_create_task_appears_after_refetch() {
    let backend = FakeBackend::default().signed_in("a@b.com");
    let mut h = Harness::start(backend).await;
    assert!(h.titles().is_empty());

    h.type_text("Buy milk").await;
    h.key(KeyCode::Tab).await;
    h.type_text("2 liters").await;
    h.key(KeyCode::Enter).await;

    assert_eq!(h.titles(), vec!["Buy milk"]);
    let tasks = h.app.tasks().unwrap();
    assert_eq!(tasks.tasks[0].email, "a@b.com");
    assert_eq!(tasks.tasks[0].description, "2 liters");
    assert_eq!(tasks.message.as_deref(), Some(TASK_ADDED));
    assert!(tasks.title.is_empty());
    assert!(tasks.description.is_empty());
    assert!(!tasks.in_flight);
    assert_eq!(
        h.backend.calls(),
        vec!["list a@b.com", "insert Buy milk", "list a@b.com"]
    );
}

#[tokio::test]
async fn test_edit_task_updates_by_id() {
    let backend =
        FakeBackend::with_tasks(vec![task("5", "Old", "a@b.com")]).signed_in("a@b.com");
    let mut h = Harness::start(backend).await;

    h.key(KeyCode::BackTab).await;
    h.key(KeyCode::Enter).await;
    assert_eq!(h.app.tasks().unwrap().title.value(), "Old");

    h.press(KeyCode::Char('u'), KeyModifiers::CONTROL).await;
    h.type_text("Buy bread").await;
    h.key(KeyCode::Enter).await;

    assert_eq!(h.titles(), vec!["Buy bread"]);
    let tasks = h.app.tasks().unwrap();
    assert!(tasks.editing.is_none());
    assert_eq!(tasks.message.as_deref(), Some(TASK_UPDATED));
    assert!(h.backend.calls().contains(&"update 5".to_string()));
}

#[tokio::test]
async fn test_delete_task_refetches() {
    let backend = FakeBackend::with_tasks(vec![
        task("1", "First", "a@b.com"),
        task("2", "Second", "a@b.com"),
    ])
    .signed_in("a@b.com");
    let mut h = Harness::start(backend).await;

    h.key(KeyCode::BackTab).await;
    h.key(KeyCode::Down).await;
    h.key(KeyCode::Char('d')).await;

    assert_eq!(h.titles(), vec!["First"]);
    assert!(h.backend.calls().contains(&"delete 2".to_string()));
}

#[tokio::test]
async fn test_realtime_insert_is_appended_without_owner_check() {
    let backend = FakeBackend::default().signed_in("a@b.com");
    let mut h = Harness::start(backend).await;

    h.backend
        .push_realtime(RealtimeMessage::Insert(task("9", "Foreign", "c@d.com")));
    h.next_inbox_event().await;

    assert_eq!(h.titles(), vec!["Foreign"]);
}

#[tokio::test]
async fn test_sign_out_returns_to_auth_and_closes_channel() {
    let backend = FakeBackend::default().signed_in("a@b.com");
    let mut h = Harness::start(backend).await;

    h.press(KeyCode::Char('l'), KeyModifiers::CONTROL).await;

    assert!(h.app.session.is_none());
    assert!(h.app.auth_form().is_some());
    let channels = h.backend.channels.lock().unwrap();
    assert!(channels.iter().all(|(_, cancel)| cancel.is_cancelled()));
}

#[tokio::test]
async fn test_expired_session_is_refreshed_in_place() {
    let backend = FakeBackend::default().signed_in("a@b.com");
    backend.session.lock().unwrap().as_mut().unwrap().expires_at = Some(now_secs() - 10);
    let mut h = Harness::start(backend).await;
    let mount = h.app.tasks().unwrap().mount;

    let effects = update::update(&mut h.app, UiEvent::Tick);
    assert_eq!(effects, vec![UiEffect::RefreshSession]);
    h.settle(effects).await;

    assert_eq!(h.app.tasks().unwrap().mount, mount);
    assert!(!h.app.refresh.in_flight);
}
