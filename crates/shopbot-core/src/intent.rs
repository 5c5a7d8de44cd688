//! Rule-based intent classification.
//!
//! Categories overlap ("how much is this in stock" is both a price and an
//! availability question), so rules are evaluated top to bottom and the
//! first match wins:
//!
//! | Order | Intent | Vocabulary |
//! |-------|--------|------------|
//! | 1 | `price` | price, cost, how much, rupee, rs, `₹` |
//! | 2 | `availability` | available, in stock, stock, have, qty, quantity |
//! | 3 | `search` | show, find, search, looking for, recommend, browse, list |
//! | 4 | `greeting` | hi, hello, hey, good morning/afternoon/evening, help |
//!
//! Anything else is [`Intent::Unknown`]. Matching is case-insensitive and
//! anchored on word boundaries, so "this" never triggers the `hi` rule.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Intent;

static RULES: LazyLock<Vec<(Intent, Regex)>> = LazyLock::new(|| {
    [
        (
            Intent::Price,
            // `₹` is not a word character, so it sits outside the \b group.
            r"\b(?:price|prices|pricing|cost|costs|how much|rupee|rupees|rs|inr)\b|₹",
        ),
        (
            Intent::Availability,
            r"\b(?:available|availability|in stock|out of stock|stock|have|qty|quantity)\b",
        ),
        (
            Intent::Search,
            r"\b(?:show|find|search|looking for|recommend|browse|list)\b",
        ),
        (
            Intent::Greeting,
            r"\b(?:hi|hello|hey|good morning|good afternoon|good evening|help)\b",
        ),
    ]
    .into_iter()
    .map(|(intent, pattern)| {
        let re = Regex::new(pattern).unwrap_or_else(|e| panic!("bad {intent} rule: {e}"));
        (intent, re)
    })
    .collect()
});

/// Classify a user message into an [`Intent`].
///
/// Empty or whitespace-only input is [`Intent::Unknown`].
pub fn classify(text: &str) -> Intent {
    if text.trim().is_empty() {
        return Intent::Unknown;
    }
    let lowered = text.to_lowercase();
    RULES
        .iter()
        .find(|(_, re)| re.is_match(&lowered))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

/// The rule tags in evaluation order.
pub fn rule_order() -> Vec<Intent> {
    RULES.iter().map(|(intent, _)| *intent).collect()
}
