//! Catalog import from a storefront JSON export.
//!
//! The file is a JSON array of product documents in the storefront's shape:
//!
//! ```json
//! [
//!   { "id": "bm-1", "name": "Blue Mug", "tags": ["blue", "mug"],
//!     "priceINR": 299, "stock": 3, "sku": "BM-1" }
//! ]
//! ```
//!
//! A missing `nameLowercase` is derived from `name`, and a missing `id`
//! gets a fresh UUID. Existing products with the same id are replaced.

use anyhow::{bail, Context, Result};
use std::path::Path;

use shopbot_core::models::Product;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteCatalog;

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub upserted: usize,
    pub skipped: usize,
    pub total_in_catalog: i64,
}

/// Fill derived fields; `None` if the product has no usable name.
pub fn normalize(mut product: Product) -> Option<Product> {
    product.name = product.name.trim().to_string();
    if product.name.is_empty() {
        return None;
    }
    if product.name_lowercase.trim().is_empty() {
        product.name_lowercase = product.name.to_lowercase();
    }
    if product.id.trim().is_empty() {
        product.id = uuid::Uuid::new_v4().to_string();
    }
    Some(product)
}

pub fn parse_products(json: &str) -> Result<Vec<Product>> {
    let products: Vec<Product> =
        serde_json::from_str(json).context("Catalog file must be a JSON array of products")?;
    Ok(products)
}

/// Upsert every product from `products` into `catalog`.
pub async fn import_products(catalog: &SqliteCatalog, products: Vec<Product>) -> Result<ImportSummary> {
    let mut upserted = 0;
    let mut skipped = 0;
    for product in products {
        match normalize(product) {
            Some(product) => {
                catalog
                    .upsert_product(&product)
                    .await
                    .with_context(|| format!("Failed to store product '{}'", product.id))?;
                upserted += 1;
            }
            None => {
                tracing::warn!("skipping product without a name");
                skipped += 1;
            }
        }
    }
    Ok(ImportSummary {
        upserted,
        skipped,
        total_in_catalog: catalog.count_products().await?,
    })
}

/// `shopbot import <file>`.
pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let products = parse_products(&json)?;
    if products.is_empty() {
        bail!("Catalog file {} contains no products", path.display());
    }

    let pool = db::connect(config).await?;
    let catalog = SqliteCatalog::new(pool);
    let summary = import_products(&catalog, products).await?;
    catalog.pool().close().await;

    println!("Import: {}", path.display());
    println!("  upserted products: {}", summary.upserted);
    println!("  skipped: {}", summary.skipped);
    println!("  products in catalog: {}", summary.total_in_catalog);
    println!("ok");
    Ok(())
}
