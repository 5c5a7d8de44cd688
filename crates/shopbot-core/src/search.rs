//! Two-stage catalog search.
//!
//! 1. **Prefix phrase.** Keywords joined with spaces form a phrase; products
//!    whose `nameLowercase` lies in `[phrase, phrase + U+F8FF)` are fetched,
//!    ordered by name, capped at `top_k`.
//! 2. **Tag fallback.** Only when stage 1 found nothing: products whose tags
//!    intersect the first [`MAX_IN_VALUES`] keywords, capped at `top_k`.
//!
//! A failing store query (missing index, network error, timeout) counts as
//! "nothing found" for that stage and never reaches the caller. Results are
//! returned in store order.

use anyhow::{bail, Result};

use crate::models::Product;
use crate::store::{
    CatalogStore, MAX_IN_VALUES, NAME_LOWERCASE_FIELD, PREFIX_SENTINEL, PRODUCTS_COLLECTION,
    TAGS_FIELD,
};

/// Default cap on the candidate set.
pub const DEFAULT_TOP_K: usize = 6;

/// Result of one stage after store errors have been absorbed.
enum StageOutcome {
    Found(Vec<Product>),
    Empty,
}

impl StageOutcome {
    fn from_query(stage: &str, result: Result<Vec<Product>>) -> Self {
        match result {
            Ok(products) if !products.is_empty() => StageOutcome::Found(products),
            Ok(_) => StageOutcome::Empty,
            Err(e) => {
                tracing::warn!(stage, error = %e, "catalog query failed; treating as no results");
                StageOutcome::Empty
            }
        }
    }
}

/// Search the catalog for products matching `keywords`.
///
/// Returns at most `top_k` products. Store failures yield an empty list;
/// the only error is a malformed call (`top_k == 0`).
pub async fn search<S>(store: &S, keywords: &[String], top_k: usize) -> Result<Vec<Product>>
where
    S: CatalogStore + ?Sized,
{
    if top_k == 0 {
        bail!("top_k must be >= 1");
    }

    if let StageOutcome::Found(mut products) = prefix_stage(store, keywords, top_k).await {
        products.truncate(top_k);
        tracing::debug!(count = products.len(), "prefix match");
        return Ok(products);
    }

    if let StageOutcome::Found(mut products) = tag_stage(store, keywords, top_k).await {
        products.truncate(top_k);
        tracing::debug!(count = products.len(), "tag fallback match");
        return Ok(products);
    }

    Ok(Vec::new())
}

/// The phrase used for the prefix stage.
pub fn prefix_phrase(keywords: &[String]) -> String {
    keywords.join(" ")
}

async fn prefix_stage<S>(store: &S, keywords: &[String], top_k: usize) -> StageOutcome
where
    S: CatalogStore + ?Sized,
{
    let phrase = prefix_phrase(keywords);
    if phrase.is_empty() {
        return StageOutcome::Empty;
    }
    let upper = format!("{}{}", phrase, PREFIX_SENTINEL);
    let result = store
        .query_prefix_range(
            PRODUCTS_COLLECTION,
            NAME_LOWERCASE_FIELD,
            &phrase,
            &upper,
            NAME_LOWERCASE_FIELD,
            top_k,
        )
        .await;
    StageOutcome::from_query("prefix", result)
}

async fn tag_stage<S>(store: &S, keywords: &[String], top_k: usize) -> StageOutcome
where
    S: CatalogStore + ?Sized,
{
    if keywords.is_empty() {
        return StageOutcome::Empty;
    }
    let values = &keywords[..keywords.len().min(MAX_IN_VALUES)];
    let result = store
        .query_array_intersects(PRODUCTS_COLLECTION, TAGS_FIELD, values, top_k)
        .await;
    StageOutcome::from_query("tags", result)
}
