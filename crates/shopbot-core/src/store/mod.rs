//! Collaborator traits for the assistant.
//!
//! The [`CatalogStore`] trait is the only way the pipeline reaches product
//! data, and [`HistoryStore`] is the only way conversation logs are
//! persisted. Both are modelled on a remote document store: queries name a
//! collection and a field, and a store without an index for that field
//! reports an error instead of scanning.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Message, Product};

/// Collection holding catalog products.
pub const PRODUCTS_COLLECTION: &str = "products";

/// Lowercased product name, the key for prefix range queries.
pub const NAME_LOWERCASE_FIELD: &str = "nameLowercase";

/// Product tag set, the key for intersection queries.
pub const TAGS_FIELD: &str = "tags";

/// Highest private-use code point; `phrase + PREFIX_SENTINEL` bounds a
/// "starts with phrase" range from above.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Store-imposed cap on the value list of a set-membership query.
pub const MAX_IN_VALUES: usize = 10;

/// Read access to the product catalog.
///
/// Both methods return stored documents merged with their identifier in
/// [`Product::id`].
///
/// | Method | Query |
/// |--------|-------|
/// | [`query_prefix_range`](CatalogStore::query_prefix_range) | `lower <= field < upper`, ordered, limited |
/// | [`query_array_intersects`](CatalogStore::query_array_intersects) | array `field` shares any of `values`, limited |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Products whose string `field` lies in `[lower, upper)`, ordered by
    /// `order_by`, at most `limit` of them.
    async fn query_prefix_range(
        &self,
        collection: &str,
        field: &str,
        lower: &str,
        upper: &str,
        order_by: &str,
        limit: usize,
    ) -> Result<Vec<Product>>;

    /// Products whose array `field` contains at least one of `values`.
    ///
    /// `values` holds at most [`MAX_IN_VALUES`] entries.
    async fn query_array_intersects(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
        limit: usize,
    ) -> Result<Vec<Product>>;
}

/// Per-session persistence of the conversation log.
///
/// Persistence is best-effort: callers ignore failures.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The stored log for `session_id`, empty if none was saved.
    async fn load(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Replace the stored log for `session_id`.
    async fn save(&self, session_id: &str, messages: &[Message]) -> Result<()>;
}
