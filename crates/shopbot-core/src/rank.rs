//! Best-match selection over a candidate set.
//!
//! Each candidate is scored against the keywords using a lowercase haystack
//! of `name + " " + tags + " " + description`:
//!
//! - `+1.0` per keyword found anywhere in the haystack (plain substring, so
//!   "mug" also hits "smuggle");
//! - `+0.1` when the product is in stock.
//!
//! Candidates are stably sorted by score, so ties go to the earlier
//! candidate, i.e. the order the store returned them in.

use std::cmp::Ordering;

use crate::models::Product;

pub const KEYWORD_WEIGHT: f64 = 1.0;
pub const IN_STOCK_BONUS: f64 = 0.1;

/// A candidate paired with its score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub product: &'a Product,
    pub score: f64,
}

fn haystack(product: &Product) -> String {
    format!(
        "{} {} {}",
        product.name,
        product.tags.join(" "),
        product.description
    )
    .to_lowercase()
}

/// Score one product against `keywords`.
pub fn score(product: &Product, keywords: &[String]) -> f64 {
    let hay = haystack(product);
    let hits = keywords
        .iter()
        .filter(|k| !k.is_empty() && hay.contains(k.as_str()))
        .count();
    let mut total = hits as f64 * KEYWORD_WEIGHT;
    if product.in_stock() {
        total += IN_STOCK_BONUS;
    }
    total
}

/// Score every candidate and sort best-first, keeping input order on ties.
pub fn rank<'a>(candidates: &'a [Product], keywords: &[String]) -> Vec<ScoredCandidate<'a>> {
    let mut scored: Vec<ScoredCandidate<'a>> = candidates
        .iter()
        .map(|product| ScoredCandidate {
            product,
            score: score(product, keywords),
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

/// The highest-scoring candidate, or `None` for an empty set.
pub fn pick_best<'a>(candidates: &'a [Product], keywords: &[String]) -> Option<&'a Product> {
    rank(candidates, keywords).first().map(|s| s.product)
}
