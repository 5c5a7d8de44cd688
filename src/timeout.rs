//! Per-query timeout for any [`CatalogStore`].
//!
//! [`TimeoutCatalog`] wraps a store and fails a query that runs longer than
//! the configured duration. The core search treats that failure like any
//! other store error (no results for that stage), so a hung backend delays a
//! reply by at most two timeouts instead of leaving the session loading.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use shopbot_core::models::Product;
use shopbot_core::store::CatalogStore;

pub struct TimeoutCatalog<S> {
    inner: S,
    timeout: Duration,
}

impl<S: CatalogStore> TimeoutCatalog<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CatalogStore> CatalogStore for TimeoutCatalog<S> {
    async fn query_prefix_range(
        &self,
        collection: &str,
        field: &str,
        lower: &str,
        upper: &str,
        order_by: &str,
        limit: usize,
    ) -> Result<Vec<Product>> {
        let query = self
            .inner
            .query_prefix_range(collection, field, lower, upper, order_by, limit);
        tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| anyhow!("prefix query timed out after {:?}", self.timeout))?
    }

    async fn query_array_intersects(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
        limit: usize,
    ) -> Result<Vec<Product>> {
        let query = self
            .inner
            .query_array_intersects(collection, field, values, limit);
        tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| anyhow!("tag query timed out after {:?}", self.timeout))?
    }
}
