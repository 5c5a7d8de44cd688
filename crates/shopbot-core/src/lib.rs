//! # Shopbot Core
//!
//! Shared logic for the storefront assistant: data models, intent rules,
//! keyword extraction, two-stage catalog search, match ranking, reply
//! formatting, and the conversation orchestrator.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Storage is reached
//! only through the [`store::CatalogStore`] and [`store::HistoryStore`]
//! traits, so the pipeline runs the same against SQLite, an in-memory
//! catalog, or a remote document store.
//!
//! ## Pipeline
//!
//! ```text
//! text ──▶ intent::classify ──▶ Intent
//!   │
//!   └───▶ keywords::extract_keywords ──▶ search::search ──▶ rank::pick_best
//!                                          (prefix, then tags)      │
//!                                                                   ▼
//!                                             conversation::Conversation ──▶ reply
//! ```

pub mod conversation;
pub mod format;
pub mod intent;
pub mod keywords;
pub mod models;
pub mod rank;
pub mod search;
pub mod store;

pub use conversation::{Conversation, ConversationSnapshot, Reply};
pub use models::{Intent, Message, Product, Role};
