//! Full-screen TUI for taskdeck.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};
use std::sync::Arc;

use anyhow::Result;
pub use features::{auth_form, tasks};
pub use runtime::TuiRuntime;
use taskdeck_core::Backend;
use taskdeck_core::config::{Config, paths};

/// Runs the interactive task manager until the user quits.
pub async fn run(config: &Config, backend: Arc<dyn Backend>) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!("taskdeck requires a terminal.");
    }

    let mut err = stderr();
    writeln!(err, "taskdeck")?;
    let config_path = paths::config_path();
    if config_path.exists() {
        writeln!(err, "Config: {}", config_path.display())?;
    }
    err.flush()?;

    let mut runtime = TuiRuntime::new(backend, config.realtime.clone())?;
    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
