//! # Shopbot
//!
//! **A rule-based shopping assistant for an e-commerce storefront.**
//!
//! Shopbot answers free-text questions such as "price of terracotta vase" or
//! "is the blue mug in stock?" by classifying intent, extracting search
//! keywords, querying the product catalog, and ranking candidates. The
//! pipeline itself lives in [`shopbot_core`]; this crate supplies the SQLite
//! catalog and history stores, configuration, the CLI, and the HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────┐   ┌───────────────┐
//! │ CLI/HTTP │──▶│ shopbot_core::Conversation│──▶│ SqliteCatalog │
//! │          │   │ classify → search → rank │   │ SqliteHistory │
//! └──────────┘   └──────────────────────────┘   └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! shopbot init                          # create database
//! shopbot import catalog.json           # load products
//! shopbot ask "price of blue mug"       # one-shot question
//! shopbot chat                          # interactive session
//! shopbot serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | SQLite `CatalogStore` and `HistoryStore` |
//! | [`timeout`] | Per-query timeout decorator for catalog stores |
//! | [`backend`] | Collaborator wiring and conversation construction |
//! | [`import`] | Catalog import from a JSON export |
//! | [`chat`] | CLI commands: ask, chat, classify, search, history |
//! | [`server`] | HTTP chat server (Axum) with CORS |

pub mod backend;
pub mod chat;
pub mod config;
pub mod db;
pub mod import;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod timeout;

pub use shopbot_core as core;
