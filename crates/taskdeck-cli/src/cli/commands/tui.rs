//! Interactive mode handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use taskdeck_core::config::Config;
use taskdeck_core::{Backend, SupabaseClient};

pub async fn run(config: &Config) -> Result<()> {
    let backend: Arc<dyn Backend> = Arc::new(SupabaseClient::from_config(config)?);
    taskdeck_tui::run(config, backend)
        .await
        .context("interactive session failed")
}
