//! # Shopbot CLI (`shopbot`)
//!
//! ## Usage
//!
//! ```bash
//! shopbot --config ./config/shopbot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shopbot init` | Create the SQLite database and run schema migrations |
//! | `shopbot import <file>` | Load products from a JSON catalog export |
//! | `shopbot ask "<text>"` | Answer one message and print the reply |
//! | `shopbot chat` | Interactive session on stdin |
//! | `shopbot classify "<text>"` | Show intent and keywords for a message |
//! | `shopbot search "<text>"` | Show scored catalog candidates for a message |
//! | `shopbot history` | Print a session's stored messages |
//! | `shopbot serve` | Start the HTTP chat server |
//!
//! Logs go to stderr; set `RUST_LOG=debug` for per-message detail.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopbot::{chat, config, import, migrate, server};

/// Shopbot: a rule-based storefront assistant.
#[derive(Parser)]
#[command(
    name = "shopbot",
    about = "Shopbot: a rule-based storefront assistant",
    version,
    long_about = "Shopbot answers product questions (prices, stock, browsing) by classifying \
    intent, extracting keywords, searching the catalog, and ranking the matches."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shopbot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the products, product_tags and
    /// chat_history tables. Safe to run repeatedly.
    Init,

    /// Import products from a JSON array file.
    Import {
        /// Path to the catalog JSON file.
        file: PathBuf,
    },

    /// Answer a single message.
    Ask {
        /// The message text.
        text: String,

        /// Conversation session id.
        #[arg(long, default_value = chat::DEFAULT_SESSION)]
        session: String,
    },

    /// Chat interactively; one message per line, `/quit` to exit.
    Chat {
        /// Conversation session id.
        #[arg(long, default_value = chat::DEFAULT_SESSION)]
        session: String,
    },

    /// Show the intent and keywords extracted from a message.
    Classify {
        /// The message text.
        text: String,
    },

    /// Show catalog candidates for a message, best first.
    Search {
        /// The message text.
        text: String,

        /// Maximum number of candidates (defaults to `assistant.top_k`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the stored messages of a session.
    History {
        /// Conversation session id.
        #[arg(long, default_value = chat::DEFAULT_SESSION)]
        session: String,
    },

    /// Start the HTTP chat server on `[server].bind`.
    Serve,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Classify { text } = &cli.command {
        return chat::run_classify(text);
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            import::run_import(&cfg, &file).await?;
        }
        Commands::Ask { text, session } => {
            chat::run_ask(&cfg, &session, &text).await?;
        }
        Commands::Chat { session } => {
            chat::run_chat(&cfg, &session).await?;
        }
        Commands::Search { text, limit } => {
            chat::run_search(&cfg, &text, limit).await?;
        }
        Commands::History { session } => {
            chat::run_history(&cfg, &session).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Classify { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
