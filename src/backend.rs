//! Wiring between configuration, SQLite, and the core orchestrator.
//!
//! A [`Backend`] holds the collaborators for one process: the SQLite
//! catalog (wrapped in a [`TimeoutCatalog`] when `assistant.search_timeout_ms`
//! is set) and the SQLite history store. Every [`Conversation`] it opens
//! shares them.

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use shopbot_core::store::{CatalogStore, HistoryStore};
use shopbot_core::Conversation;

use crate::config::{AssistantConfig, Config};
use crate::db;
use crate::sqlite_store::{SqliteCatalog, SqliteHistory};
use crate::timeout::TimeoutCatalog;

#[derive(Clone)]
pub struct Backend {
    pool: SqlitePool,
    catalog: Arc<dyn CatalogStore>,
    history: Arc<dyn HistoryStore>,
    assistant: AssistantConfig,
}

impl Backend {
    /// Connect to the configured database.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        Ok(Self::from_pool(pool, &config.assistant))
    }

    pub fn from_pool(pool: SqlitePool, assistant: &AssistantConfig) -> Self {
        let sqlite = SqliteCatalog::new(pool.clone());
        let catalog: Arc<dyn CatalogStore> = match assistant.search_timeout() {
            Some(timeout) => Arc::new(TimeoutCatalog::new(sqlite, timeout)),
            None => Arc::new(sqlite),
        };
        Self {
            history: Arc::new(SqliteHistory::new(pool.clone())),
            pool,
            catalog,
            assistant: assistant.clone(),
        }
    }

    pub fn catalog(&self) -> Arc<dyn CatalogStore> {
        self.catalog.clone()
    }

    pub fn history(&self) -> Arc<dyn HistoryStore> {
        self.history.clone()
    }

    /// Build a conversation for `session_id` and restore its saved log.
    pub async fn conversation(&self, session_id: &str) -> Conversation {
        let conversation = Conversation::new(self.catalog.clone(), session_id)
            .with_history(self.history.clone())
            .with_top_k(self.assistant.top_k)
            .with_history_limit(self.assistant.history_limit);
        conversation.restore().await;
        conversation
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
