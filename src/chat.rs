//! CLI front-ends for the assistant.
//!
//! | Command | Function |
//! |---------|----------|
//! | `shopbot ask "<text>"` | [`run_ask`] |
//! | `shopbot chat` | [`run_chat`] |
//! | `shopbot classify "<text>"` | [`run_classify`] |
//! | `shopbot search "<text>"` | [`run_search`] |
//! | `shopbot history` | [`run_history`] |

use anyhow::{bail, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use shopbot_core::format::format_inr;
use shopbot_core::intent::classify;
use shopbot_core::keywords::extract_keywords;
use shopbot_core::models::{Message, Role};
use shopbot_core::rank::rank;
use shopbot_core::search::search;

use crate::backend::Backend;
use crate::config::{Config, MAX_TOP_K};

/// Session used when `--session` is not given.
pub const DEFAULT_SESSION: &str = "cli";

/// Answer a single message and print the bot reply.
pub async fn run_ask(config: &Config, session: &str, text: &str) -> Result<()> {
    let backend = Backend::open(config).await?;
    let conversation = backend.conversation(session).await;
    let reply = conversation.send_message(text).await;
    println!("{}", reply.text);
    backend.close().await;
    Ok(())
}

/// Line-oriented chat on stdin until EOF or `/quit`.
pub async fn run_chat(config: &Config, session: &str) -> Result<()> {
    let backend = Backend::open(config).await?;
    let conversation = backend.conversation(session).await;

    if let Some(last) = conversation.messages().last() {
        print_message(last);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }
        let reply = conversation.send_message(text).await;
        println!("bot: {}", reply.text);
    }

    backend.close().await;
    Ok(())
}

/// Print the intent and keywords for `text` without touching the catalog.
pub fn run_classify(text: &str) -> Result<()> {
    println!("intent: {}", classify(text));
    println!("keywords: [{}]", extract_keywords(text).join(", "));
    Ok(())
}

/// Run the catalog search for `text` and print every scored candidate.
pub async fn run_search(config: &Config, text: &str, limit: Option<usize>) -> Result<()> {
    let top_k = resolve_limit(limit, config.assistant.top_k)?;
    let backend = Backend::open(config).await?;
    let keywords = extract_keywords(text);
    let candidates = search(backend.catalog().as_ref(), &keywords, top_k).await?;

    println!("keywords: [{}]", keywords.join(", "));
    if candidates.is_empty() {
        println!("No results.");
    } else {
        for (i, scored) in rank(&candidates, &keywords).iter().enumerate() {
            let p = scored.product;
            let marker = if i == 0 { " (best)" } else { "" };
            println!(
                "{}. [{:.2}] {} — {} — stock {}{}",
                i + 1,
                scored.score,
                p.name,
                format_inr(p.price_inr),
                p.stock_count(),
                marker
            );
            println!("    id: {}", p.id);
        }
    }

    backend.close().await;
    Ok(())
}

/// `--limit` if given, else the configured `top_k`; held to the same range
/// as `assistant.top_k`.
fn resolve_limit(limit: Option<usize>, configured: usize) -> Result<usize> {
    match limit {
        Some(n) if !(1..=MAX_TOP_K).contains(&n) => {
            bail!("--limit must be in [1, {}], got {}", MAX_TOP_K, n)
        }
        Some(n) => Ok(n),
        None => Ok(configured),
    }
}

/// Print the stored log for `session`.
pub async fn run_history(config: &Config, session: &str) -> Result<()> {
    let backend = Backend::open(config).await?;
    let messages = backend.history().load(session).await?;
    if messages.is_empty() {
        println!("No history for session '{}'.", session);
    }
    for message in &messages {
        print_message(message);
    }
    backend.close().await;
    Ok(())
}

fn print_message(message: &Message) {
    let who = match message.role {
        Role::User => "you",
        Role::Bot => "bot",
    };
    println!("{}: {}", who, message.content);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None, 6).unwrap(), 6);
        assert_eq!(resolve_limit(Some(1), 6).unwrap(), 1);
        assert_eq!(resolve_limit(Some(MAX_TOP_K), 6).unwrap(), MAX_TOP_K);
    }

    #[test]
    fn test_resolve_limit_rejects_out_of_range() {
        let err = resolve_limit(Some(0), 6).unwrap_err();
        assert!(err.to_string().contains("--limit must be in [1, 50]"));
        assert!(resolve_limit(Some(MAX_TOP_K + 1), 6).is_err());
    }
}
