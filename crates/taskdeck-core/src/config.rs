//! Configuration management for taskdeck.
//!
//! Loads configuration from ${TASKDECK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable consulted when `backend.url` is unset.
pub const URL_ENV_VAR: &str = "TASKDECK_SUPABASE_URL";

/// Environment variable consulted when `backend.anon_key` is unset.
pub const ANON_KEY_ENV_VAR: &str = "TASKDECK_SUPABASE_ANON_KEY";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for taskdeck configuration and data directories.
    //!
    //! TASKDECK_HOME resolution order:
    //! 1. TASKDECK_HOME environment variable (if set)
    //! 2. ~/.config/taskdeck (default)
    //! 3. ./.taskdeck when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the taskdeck home directory.
    pub fn taskdeck_home() -> PathBuf {
        if let Ok(home) = std::env::var("TASKDECK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".taskdeck"),
            |h| h.join(".config").join("taskdeck"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        taskdeck_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        taskdeck_home().join("session.json")
    }

    /// Returns the directory that holds log files.
    pub fn logs_dir() -> PathBuf {
        taskdeck_home().join("logs")
    }
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co` (overrides environment variable).
    pub url: Option<String>,
    /// Public anon API key (overrides environment variable).
    pub anon_key: Option<String>,
    /// HTTP request timeout in seconds (0 disables).
    pub timeout_secs: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_secs: BackendConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BackendConfig {
    const DEFAULT_TIMEOUT_SECS: u32 = 30;

    /// Returns the backend URL from config, falling back to the environment.
    pub fn effective_url(&self) -> Option<String> {
        non_blank(self.url.as_deref())
            .map(ToString::to_string)
            .or_else(|| env_non_blank(URL_ENV_VAR))
    }

    /// Returns the anon key from config, falling back to the environment.
    pub fn effective_anon_key(&self) -> Option<String> {
        non_blank(self.anon_key.as_deref())
            .map(ToString::to_string)
            .or_else(|| env_non_blank(ANON_KEY_ENV_VAR))
    }

    /// Returns the request timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.timeout_secs)))
        }
    }
}

/// Task table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Table that stores tasks.
    pub table: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            table: "tasks".to_string(),
        }
    }
}

/// Realtime subscription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Whether the task list subscribes to insert notifications.
    pub enabled: bool,
    /// Channel name used for the subscription.
    pub channel: String,
    /// Database schema of the task table.
    pub schema: String,
    /// Restrict the subscription to rows owned by the signed-in email.
    ///
    /// Off by default: every insert on the table is delivered and appended.
    pub owner_filter: bool,
    /// Heartbeat interval in seconds.
    pub heartbeat_secs: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: "tasks-channel".to_string(),
            schema: "public".to_string(),
            owner_filter: false,
            heartbeat_secs: 25,
        }
    }
}

impl RealtimeConfig {
    /// Returns the heartbeat interval (never shorter than one second).
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(u64::from(self.heartbeat_secs.max(1)))
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings.
    pub backend: BackendConfig,
    /// Task table settings.
    pub tasks: TasksConfig,
    /// Realtime subscription settings.
    pub realtime: RealtimeConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn env_non_blank(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
