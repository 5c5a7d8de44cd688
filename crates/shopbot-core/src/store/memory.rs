//! In-memory collaborators for testing and embedded use.
//!
//! [`InMemoryCatalog`] keeps products in insertion order behind a
//! `std::sync::RwLock` and, like a document store, only answers queries on
//! indexed fields: range queries on `nameLowercase` and intersection
//! queries on `tags`. [`InMemoryHistory`] keeps one log per session.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::{Message, Product};

use super::{
    CatalogStore, HistoryStore, MAX_IN_VALUES, NAME_LOWERCASE_FIELD, PRODUCTS_COLLECTION,
    TAGS_FIELD,
};

/// In-memory product catalog.
pub struct InMemoryCatalog {
    products: RwLock<Vec<Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(Vec::new()),
        }
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    /// Insert a product, replacing any existing one with the same id.
    pub fn insert(&self, product: Product) -> Result<()> {
        let mut products = self
            .products
            .write()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.products.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn check_collection(collection: &str) -> Result<()> {
    if collection != PRODUCTS_COLLECTION {
        bail!("unknown collection: {}", collection);
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn query_prefix_range(
        &self,
        collection: &str,
        field: &str,
        lower: &str,
        upper: &str,
        order_by: &str,
        limit: usize,
    ) -> Result<Vec<Product>> {
        check_collection(collection)?;
        if field != NAME_LOWERCASE_FIELD || order_by != NAME_LOWERCASE_FIELD {
            bail!(
                "missing index: range on '{}' ordered by '{}'",
                field,
                order_by
            );
        }
        let products = self
            .products
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        let mut hits: Vec<Product> = products
            .iter()
            .filter(|p| p.name_lowercase.as_str() >= lower && p.name_lowercase.as_str() < upper)
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name_lowercase.cmp(&b.name_lowercase));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn query_array_intersects(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
        limit: usize,
    ) -> Result<Vec<Product>> {
        check_collection(collection)?;
        if field != TAGS_FIELD {
            bail!("missing index: array-contains-any on '{}'", field);
        }
        if values.len() > MAX_IN_VALUES {
            bail!(
                "array-contains-any supports at most {} values, got {}",
                MAX_IN_VALUES,
                values.len()
            );
        }
        let products = self
            .products
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(products
            .iter()
            .filter(|p| p.tags.iter().any(|t| values.contains(t)))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// In-memory conversation log store, keyed by session id.
#[derive(Default)]
pub struct InMemoryHistory {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn load(&self, session_id: &str) -> Result<Vec<Message>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| anyhow!("history lock poisoned"))?;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn save(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| anyhow!("history lock poisoned"))?;
        sessions.insert(session_id.to_string(), messages.to_vec());
        Ok(())
    }
}
