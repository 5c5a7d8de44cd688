//! Conversation orchestrator.
//!
//! A [`Conversation`] owns one session's message log and loading flag and
//! answers each incoming message:
//!
//! ```text
//! send_message(text)
//!   ├─ append user message
//!   ├─ classify
//!   ├─ unknown  ─▶ decline
//!   ├─ greeting ─▶ greeting help
//!   └─ price | availability | search
//!        ├─ loading = true
//!        ├─ extract keywords ─▶ search ─▶ pick best
//!        ├─ format reply (or apology on failure)
//!        └─ loading = false (only if no newer request started)
//! ```
//!
//! Every call appends exactly one user message followed by exactly one bot
//! message and never returns an error: failures become an apology reply.
//! The log is append-only behind a mutex, so concurrent calls may interleave
//! whole messages but never corrupt the log. Saves to the history store are
//! serialized per conversation and each one writes the log as it stands when
//! the save starts, so the last save to finish always holds the newest tail.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use serde::Serialize;

use crate::format;
use crate::intent::classify;
use crate::keywords::extract_keywords;
use crate::models::{Intent, Message, Product};
use crate::rank::pick_best;
use crate::search::{search, DEFAULT_TOP_K};
use crate::store::{CatalogStore, HistoryStore};

/// Messages kept when persisting a session log.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Everything decided while answering one message.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub intent: Intent,
    pub text: String,
    /// Keywords sent to the catalog; empty when no search ran.
    pub keywords: Vec<String>,
    /// Candidates returned by the catalog; empty when no search ran.
    pub candidates: Vec<Product>,
}

/// Read-only copy of a conversation's observable state.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub loading: bool,
}

#[derive(Default)]
struct State {
    messages: Vec<Message>,
    loading: bool,
    /// Id of the most recently started catalog request.
    latest_request: u64,
}

/// One session's assistant.
pub struct Conversation {
    session_id: String,
    catalog: Arc<dyn CatalogStore>,
    history: Option<Arc<dyn HistoryStore>>,
    top_k: usize,
    history_limit: usize,
    state: Mutex<State>,
    save_lock: tokio::sync::Mutex<()>,
}

impl Conversation {
    pub fn new(catalog: Arc<dyn CatalogStore>, session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            catalog,
            history: None,
            top_k: DEFAULT_TOP_K,
            history_limit: DEFAULT_HISTORY_LIMIT,
            state: Mutex::new(State::default()),
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Load the persisted log for this session.
    ///
    /// An empty, missing, or unreadable log starts the session with the
    /// default greeting instead.
    pub async fn restore(&self) {
        let restored = match &self.history {
            Some(history) => match history.load(&self.session_id).await {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::debug!(session = %self.session_id, error = %e, "history unreadable");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let messages = if restored.is_empty() {
            vec![Message::bot(format::SESSION_GREETING)]
        } else {
            restored
        };
        self.lock().messages = messages;
    }

    /// Answer one user message.
    pub async fn send_message(&self, text: &str) -> Reply {
        self.append(Message::user(text)).await;

        let intent = classify(text);
        tracing::debug!(session = %self.session_id, %intent, "classified message");

        let reply = match intent {
            Intent::Greeting => Reply::plain(intent, format::GREETING_HELP),
            _ if intent.needs_catalog() => {
                let request = self.begin_loading();
                let reply = match self.answer_from_catalog(intent, text).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::error!(
                            session = %self.session_id,
                            %intent,
                            error = %e,
                            "catalog lookup failed"
                        );
                        Reply::plain(intent, format::FAILURE)
                    }
                };
                self.end_loading(request);
                reply
            }
            _ => Reply::plain(intent, format::DECLINE),
        };

        self.append(Message::bot(reply.text.clone())).await;
        reply
    }

    async fn answer_from_catalog(&self, intent: Intent, text: &str) -> Result<Reply> {
        let keywords = extract_keywords(text);
        let candidates = search(self.catalog.as_ref(), &keywords, self.top_k).await?;
        let best = pick_best(&candidates, &keywords);

        let text = match intent {
            Intent::Search if candidates.is_empty() => format::NO_MATCHING_PRODUCTS.to_string(),
            Intent::Search => format::search_list(&candidates),
            _ => match best {
                None => format::NOT_FOUND.to_string(),
                Some(product) if intent == Intent::Price => format::price_line(product),
                Some(product) => format::availability_line(product),
            },
        };

        Ok(Reply {
            intent,
            text,
            keywords,
            candidates,
        })
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let state = self.lock();
        ConversationSnapshot {
            session_id: self.session_id.clone(),
            messages: state.messages.clone(),
            loading: state.loading,
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every critical section is a single push or flag write, so a
        // poisoned guard still holds a consistent log.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin_loading(&self) -> u64 {
        let mut state = self.lock();
        state.latest_request += 1;
        state.loading = true;
        state.latest_request
    }

    fn end_loading(&self, request: u64) {
        let mut state = self.lock();
        if state.latest_request == request {
            state.loading = false;
        }
    }

    async fn append(&self, message: Message) {
        self.lock().messages.push(message);

        let Some(history) = &self.history else {
            return;
        };
        let _saving = self.save_lock.lock().await;
        let tail = {
            let state = self.lock();
            let start = state.messages.len().saturating_sub(self.history_limit);
            state.messages[start..].to_vec()
        };
        if let Err(e) = history.save(&self.session_id, &tail).await {
            tracing::debug!(session = %self.session_id, error = %e, "history save failed");
        }
    }
}

impl Reply {
    fn plain(intent: Intent, text: &str) -> Self {
        Self {
            intent,
            text: text.to_string(),
            keywords: Vec::new(),
            candidates: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::memory::{InMemoryCatalog, InMemoryHistory};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Fails the prefix stage, answers the tag stage from a fixed list,
    /// and counts every call.
    struct IndexlessCatalog {
        tag_hits: Vec<Product>,
        calls: AtomicUsize,
    }

    impl IndexlessCatalog {
        fn new(tag_hits: Vec<Product>) -> Self {
            Self {
                tag_hits,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CatalogStore for IndexlessCatalog {
        async fn query_prefix_range(
            &self,
            _collection: &str,
            _field: &str,
            _lower: &str,
            _upper: &str,
            _order_by: &str,
            _limit: usize,
        ) -> Result<Vec<Product>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("The query requires an index"))
        }

        async fn query_array_intersects(
            &self,
            _collection: &str,
            _field: &str,
            values: &[String],
            limit: usize,
        ) -> Result<Vec<Product>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .tag_hits
                .iter()
                .filter(|p| p.tags.iter().any(|t| values.contains(t)))
                .take(limit)
                .cloned()
                .collect())
        }
    }

    /// Blocks every query until released.
    struct GatedCatalog {
        gate: Notify,
    }

    #[async_trait]
    impl CatalogStore for GatedCatalog {
        async fn query_prefix_range(
            &self,
            _collection: &str,
            _field: &str,
            _lower: &str,
            _upper: &str,
            _order_by: &str,
            _limit: usize,
        ) -> Result<Vec<Product>> {
            self.gate.notified().await;
            Ok(Vec::new())
        }

        async fn query_array_intersects(
            &self,
            _collection: &str,
            _field: &str,
            _values: &[String],
            _limit: usize,
        ) -> Result<Vec<Product>> {
            Ok(Vec::new())
        }
    }

    /// Answers every query with nothing after a short delay.
    struct SlowCatalog;

    #[async_trait]
    impl CatalogStore for SlowCatalog {
        async fn query_prefix_range(
            &self,
            _collection: &str,
            _field: &str,
            _lower: &str,
            _upper: &str,
            _order_by: &str,
            _limit: usize,
        ) -> Result<Vec<Product>> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Vec::new())
        }

        async fn query_array_intersects(
            &self,
            _collection: &str,
            _field: &str,
            _values: &[String],
            _limit: usize,
        ) -> Result<Vec<Product>> {
            Ok(Vec::new())
        }
    }

    /// Holds saves of a given length for a while before storing them.
    struct LaggingHistory {
        inner: InMemoryHistory,
        lag_len: usize,
    }

    #[async_trait]
    impl HistoryStore for LaggingHistory {
        async fn load(&self, session_id: &str) -> Result<Vec<Message>> {
            self.inner.load(session_id).await
        }

        async fn save(&self, session_id: &str, messages: &[Message]) -> Result<()> {
            if messages.len() == self.lag_len {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            self.inner.save(session_id, messages).await
        }
    }

    fn blue_mug() -> Product {
        Product::new("bm", "Blue Mug")
            .with_tags(["blue", "mug"])
            .with_price(299.0)
            .with_stock(3)
            .with_sku("BM-1")
    }

    fn shop() -> Arc<InMemoryCatalog> {
        Arc::new(InMemoryCatalog::with_products(vec![
            blue_mug(),
            Product::new("rm", "Red Mug")
                .with_tags(["red", "mug"])
                .with_price(1500.0),
            Product::new("tv", "Terracotta Vase")
                .with_tags(["terracotta", "vase"])
                .with_stock(0),
        ]))
    }

    fn roles(conv: &Conversation) -> Vec<Role> {
        conv.messages().iter().map(|m| m.role).collect()
    }

    #[tokio::test]
    async fn test_greeting_skips_search() {
        let catalog = Arc::new(IndexlessCatalog::new(Vec::new()));
        let conv = Conversation::new(catalog.clone(), "s1");
        let reply = conv.send_message("hello").await;
        assert_eq!(reply.intent, Intent::Greeting);
        assert_eq!(reply.text, format::GREETING_HELP);
        assert_eq!(roles(&conv), vec![Role::User, Role::Bot]);
        assert!(!conv.is_loading());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_price_after_prefix_index_error() {
        let catalog = Arc::new(IndexlessCatalog::new(vec![blue_mug()]));
        let conv = Conversation::new(catalog, "s1");
        let reply = conv.send_message("price of blue mug").await;
        assert_eq!(reply.intent, Intent::Price);
        assert_eq!(reply.text, "Blue Mug costs ₹299.00. SKU: BM-1.");
        assert_eq!(reply.keywords, vec!["blue", "mug"]);
    }

    #[tokio::test]
    async fn test_availability_not_found_uses_item_guidance() {
        let conv = Conversation::new(Arc::new(InMemoryCatalog::new()), "s1");
        let reply = conv.send_message("do you have terracotta vase").await;
        assert_eq!(reply.intent, Intent::Availability);
        assert_eq!(reply.text, format::NOT_FOUND);
        assert_ne!(reply.text, format::NO_MATCHING_PRODUCTS);
    }

    #[tokio::test]
    async fn test_unknown_never_touches_catalog() {
        let catalog = Arc::new(IndexlessCatalog::new(vec![blue_mug()]));
        let conv = Conversation::new(catalog.clone(), "s1");
        let reply = conv.send_message("xyzzy quantum flux").await;
        assert_eq!(reply.text, "I was not trained to answer this type of questions.");
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
        assert_eq!(roles(&conv), vec![Role::User, Role::Bot]);
    }

    #[tokio::test]
    async fn test_availability_reply() {
        let conv = Conversation::new(shop(), "s1");
        let reply = conv.send_message("is the terracotta vase available?").await;
        assert_eq!(reply.text, "Terracotta Vase is out of stock.");
        let reply = conv.send_message("is blue mug in stock").await;
        assert_eq!(
            reply.text,
            "Blue Mug is in stock (3 available) and costs ₹299.00."
        );
    }

    #[tokio::test]
    async fn test_search_lists_candidates() {
        let conv = Conversation::new(shop(), "s1");
        let reply = conv.send_message("show me mugs").await;
        // "mugs" is neither a name prefix nor a tag.
        assert_eq!(reply.text, format::NO_MATCHING_PRODUCTS);

        let reply = conv.send_message("find mug").await;
        assert_eq!(reply.candidates.len(), 2);
        assert_eq!(
            reply.text,
            "Here are some products I found:\n\
             • Blue Mug — ₹299.00 — 3 in stock\n\
             • Red Mug — ₹1,500.00 — out of stock"
        );
    }

    #[tokio::test]
    async fn test_failure_replies_with_apology_and_clears_loading() {
        let conv = Conversation::new(shop(), "s1").with_top_k(0);
        let reply = conv.send_message("price of blue mug").await;
        assert_eq!(reply.text, format::FAILURE);
        assert!(!conv.is_loading());
        assert_eq!(roles(&conv), vec![Role::User, Role::Bot]);
    }

    #[tokio::test]
    async fn test_loading_is_set_while_searching() {
        let catalog = Arc::new(GatedCatalog {
            gate: Notify::new(),
        });
        let conv = Arc::new(Conversation::new(catalog.clone(), "s1"));

        let task = tokio::spawn({
            let conv = conv.clone();
            async move { conv.send_message("price of blue mug").await }
        });
        while !conv.is_loading() {
            tokio::task::yield_now().await;
        }
        assert_eq!(roles(&conv), vec![Role::User]);

        catalog.gate.notify_one();
        let reply = task.await.unwrap();
        assert_eq!(reply.text, format::NOT_FOUND);
        assert!(!conv.is_loading());
    }

    #[tokio::test]
    async fn test_older_request_does_not_clear_newer_loading() {
        let conv = Conversation::new(shop(), "s1");
        let first = conv.begin_loading();
        let second = conv.begin_loading();
        conv.end_loading(first);
        assert!(conv.is_loading());
        conv.end_loading(second);
        assert!(!conv.is_loading());
    }

    #[tokio::test]
    async fn test_restore_seeds_greeting_and_persists_tail() {
        let history = Arc::new(InMemoryHistory::new());
        let conv = Conversation::new(shop(), "s1")
            .with_history(history.clone())
            .with_history_limit(3);
        conv.restore().await;
        assert_eq!(conv.messages()[0].content, format::SESSION_GREETING);

        conv.send_message("hello").await;
        conv.send_message("price of blue mug").await;
        assert_eq!(conv.messages().len(), 5);

        let saved = history.load("s1").await.unwrap();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[2].content, "Blue Mug costs ₹299.00. SKU: BM-1.");

        let resumed = Conversation::new(shop(), "s1").with_history(history);
        resumed.restore().await;
        assert_eq!(resumed.messages(), saved);
    }

    #[tokio::test]
    async fn test_concurrent_sends_persist_newest_log() {
        // The greeting reply's save (4 messages) lags behind the price
        // reply's save (5 messages) and must not overwrite it.
        let history = Arc::new(LaggingHistory {
            inner: InMemoryHistory::new(),
            lag_len: 4,
        });
        let conv = Conversation::new(Arc::new(SlowCatalog), "s1").with_history(history.clone());
        conv.restore().await;

        tokio::join!(
            conv.send_message("price of mug"),
            conv.send_message("hello")
        );

        let in_memory = conv.messages();
        assert_eq!(in_memory.len(), 5);
        assert_eq!(history.load("s1").await.unwrap(), in_memory);
    }

    #[tokio::test]
    async fn test_snapshot() {
        let conv = Conversation::new(shop(), "abc");
        conv.send_message("hi").await;
        let snap = conv.snapshot();
        assert_eq!(snap.session_id, "abc");
        assert_eq!(snap.messages.len(), 2);
        assert!(!snap.loading);
    }
}
