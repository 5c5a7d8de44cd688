//! Search keyword extraction.
//!
//! Turns a free-text question into a short, ordered list of lowercase
//! tokens for the catalog query:
//!
//! 1. Lowercase.
//! 2. Replace everything except letters, digits, whitespace and `-` with a space.
//! 3. Split on whitespace (collapsing runs, trimming the ends).
//! 4. Drop stopwords.
//! 5. Keep the first [`MAX_KEYWORDS`] tokens, in their original order.
//!
//! The stopword list also removes intent vocabulary such as "price",
//! "stock" and "search"; those words are consumed by the intent classifier
//! and would otherwise skew the product-name prefix query.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Upper bound on extracted keywords.
pub const MAX_KEYWORDS: usize = 6;

const STOPWORDS: &[&str] = &[
    "what", "is", "the", "a", "an", "of", "for", "please", "show", "find", "search", "do", "you",
    "have", "any", "in", "stock", "available", "price", "cost", "how", "much", "this", "that",
    "me", "on", "at", "it", "and", "to", "from", "with", "i", "need", "want", "looking", "are",
    "does", "there",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\p{L}\p{N}\s-]").unwrap_or_else(|e| panic!("bad keyword pattern: {e}"))
});

/// Whether `token` is dropped by the extractor.
pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Extract up to [`MAX_KEYWORDS`] search tokens from `text`.
pub fn extract_keywords(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|t| !t.is_empty() && !is_stopword(t))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_stopwords_and_punctuation() {
        assert_eq!(
            extract_keywords("Show me the Terracotta Vase, medium size!"),
            vec!["terracotta", "vase", "medium", "size"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   ").is_empty());
        assert!(extract_keywords("?!...").is_empty());
    }

    #[test]
    fn test_intent_words_are_removed() {
        assert_eq!(extract_keywords("price of blue mug"), vec!["blue", "mug"]);
        assert_eq!(
            extract_keywords("do you have terracotta vase"),
            vec!["terracotta", "vase"]
        );
        assert!(extract_keywords("is it in stock?").is_empty());
    }

    #[test]
    fn test_keeps_hyphens_and_unicode() {
        assert_eq!(
            extract_keywords("hand-made Café mug #2"),
            vec!["hand-made", "café", "mug", "2"]
        );
        assert_eq!(extract_keywords("मग blue"), vec!["मग", "blue"]);
    }

    #[test]
    fn test_truncates_in_original_order() {
        let kws = extract_keywords("one two three four five six seven eight nine");
        assert_eq!(kws, vec!["one", "two", "three", "four", "five", "six"]);
        let long = "vase ".repeat(500);
        assert_eq!(extract_keywords(&long).len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_extraction_is_pure() {
        let text = "Blue-green mug, large";
        assert_eq!(extract_keywords(text), extract_keywords(text));
    }
}
