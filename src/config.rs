//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/shopbot.sqlite"
//!
//! [assistant]
//! top_k = 6
//! history_limit = 50
//! search_timeout_ms = 5000   # optional
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! max_sessions = 1000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use shopbot_core::conversation::DEFAULT_HISTORY_LIMIT;
use shopbot_core::search::DEFAULT_TOP_K;

/// Largest accepted `assistant.top_k`.
pub const MAX_TOP_K: usize = 50;

/// Conversations the chat server keeps in memory by default.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Per-query catalog timeout; absent means the store's own behavior.
    #[serde(default)]
    pub search_timeout_ms: Option<u64>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            history_limit: DEFAULT_HISTORY_LIMIT,
            search_timeout_ms: None,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl AssistantConfig {
    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Live conversations held before the least recently used is dropped.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}
fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

impl Config {
    /// A config pointing at `db_path` with every other setting defaulted.
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            assistant: AssistantConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(1..=MAX_TOP_K).contains(&config.assistant.top_k) {
        anyhow::bail!("assistant.top_k must be in [1, {}]", MAX_TOP_K);
    }
    if config.assistant.history_limit == 0 {
        anyhow::bail!("assistant.history_limit must be >= 1");
    }
    if config.assistant.search_timeout_ms == Some(0) {
        anyhow::bail!("assistant.search_timeout_ms must be > 0 when set");
    }
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    if config.server.max_sessions == 0 {
        anyhow::bail!("server.max_sessions must be >= 1");
    }
    Ok(())
}
