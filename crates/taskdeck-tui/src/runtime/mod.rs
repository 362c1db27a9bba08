//! TUI runtime - owns terminal, runs event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! - Handlers send `UiEvent`s directly to `inbox_tx`
//! - Auth notifications and realtime messages are forwarded there too
//! - Runtime drains `inbox_rx` each frame to collect results
//!
//! Structure:
//! - `mod.rs`: Core runtime (TuiRuntime, event loop, effect dispatch)
//! - `inbox.rs`: Inbox channel types
//! - `handlers/`: Effect handler implementations (backend calls, forwarders)

mod handlers;
mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use taskdeck_core::Backend;
use taskdeck_core::config::RealtimeConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Interval between Tick events.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Runs the event loop and executes effects.
/// Terminal state is restored on drop or panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    backend: Arc<dyn Backend>,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    last_tick: Instant,
    /// Stops the auth notification forwarder.
    auth_cancel: CancellationToken,
}

impl TuiRuntime {
    /// Creates a new TUI runtime. Must be called inside a tokio runtime.
    pub fn new(backend: Arc<dyn Backend>, realtime: RealtimeConfig) -> Result<Self> {
        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();

        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let auth_cancel = CancellationToken::new();
        tokio::spawn(handlers::forward_auth_changes(
            backend.on_auth_state_change(),
            inbox_tx.clone(),
            auth_cancel.clone(),
        ));

        Ok(Self {
            terminal,
            state: AppState::new(realtime),
            backend,
            inbox_tx,
            inbox_rx,
            last_tick: Instant::now(),
            auth_cancel,
        })
    }

    /// Runs the main event loop until quit.
    pub fn run(&mut self) -> Result<()> {
        let effects = update::init(&mut self.state);
        self.execute_effects(effects);
        self.event_loop()
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let events = self.collect_events()?;

            for event in events {
                dirty = true;
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    /// Collects inbox results, terminal input and the periodic tick.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Block until the next tick only when there is nothing to process.
        let poll_duration = if events.is_empty() {
            TICK_INTERVAL.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= TICK_INTERVAL {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async handler and sends its result event to the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        let backend = Arc::clone(&self.backend);
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }

            // Session effects
            UiEffect::LoadSession => {
                self.spawn_effect(move || handlers::load_session(backend));
            }
            UiEffect::SignUp { email, password } => {
                self.spawn_effect(move || handlers::sign_up(backend, email, password));
            }
            UiEffect::SignIn { email, password } => {
                self.spawn_effect(move || handlers::sign_in(backend, email, password));
            }
            UiEffect::SignOut => {
                self.spawn_effect(move || handlers::sign_out(backend));
            }
            UiEffect::RefreshSession => {
                self.spawn_effect(move || handlers::refresh_session(backend));
            }

            // Task effects
            UiEffect::FetchTasks {
                mount,
                owner,
                reason,
            } => {
                self.spawn_effect(move || handlers::fetch_tasks(backend, mount, owner, reason));
            }
            UiEffect::InsertTask { mount, task } => {
                self.spawn_effect(move || handlers::insert_task(backend, mount, task));
            }
            UiEffect::UpdateTask { mount, id, patch } => {
                self.spawn_effect(move || handlers::update_task(backend, mount, id, patch));
            }
            UiEffect::DeleteTask { mount, id } => {
                self.spawn_effect(move || handlers::delete_task(backend, mount, id));
            }
            UiEffect::SubscribeInserts { mount, filter } => {
                let inbox = self.inbox_tx.clone();
                self.spawn_effect(move || {
                    handlers::subscribe_inserts(backend, mount, filter, inbox)
                });
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        self.auth_cancel.cancel();
        let _ = terminal::restore_terminal();
    }
}
