//! Auth command handlers.

use anyhow::{Context, Result};
use taskdeck_core::config::Config;
use taskdeck_core::{Backend, SessionStore, SupabaseClient};

/// Signs out the persisted session without opening the TUI.
pub async fn logout(config: &Config) -> Result<()> {
    let store = SessionStore::default();
    if store.load().context("read session")?.is_none() {
        println!("Not signed in.");
        return Ok(());
    }

    let client = SupabaseClient::from_config(config)?;
    client.sign_out().await.context("sign out")?;
    println!("Signed out.");
    Ok(())
}
