//! Core data models used throughout Shopbot.
//!
//! These types represent the conversation turns, classified intents, and
//! catalog products that flow through the assistant pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// One turn in the conversation log.
///
/// Messages are append-only: once pushed onto a log they are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Reply text. Search results span multiple lines.
    pub content: String,
    /// Creation time, recorded for user messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            time: Some(Utc::now()),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            time: None,
        }
    }
}

/// The classified purpose of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Price,
    Availability,
    Search,
    Greeting,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Price => "price",
            Intent::Availability => "availability",
            Intent::Search => "search",
            Intent::Greeting => "greeting",
            Intent::Unknown => "unknown",
        }
    }

    /// Intents answered by querying the catalog.
    pub fn needs_catalog(&self) -> bool {
        matches!(self, Intent::Price | Intent::Availability | Intent::Search)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product, owned by the external store and read-only here.
///
/// External field names follow the storefront's document shape
/// (`nameLowercase`, `priceINR`) so exported catalogs deserialize as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Precomputed `name.to_lowercase()`, the key for prefix queries.
    #[serde(default)]
    pub name_lowercase: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "priceINR", default, skip_serializing_if = "Option::is_none")]
    pub price_inr: Option<f64>,
    #[serde(alias = "quantity", default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            name_lowercase: name.to_lowercase(),
            name,
            ..Default::default()
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_price(mut self, price_inr: f64) -> Self {
        self.price_inr = Some(price_inr);
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Units on hand; a missing stock field counts as zero.
    pub fn stock_count(&self) -> i64 {
        self.stock.unwrap_or(0)
    }

    pub fn in_stock(&self) -> bool {
        self.stock_count() > 0
    }
}
