//! SQLite-backed collaborators.
//!
//! [`SqliteCatalog`] implements [`CatalogStore`] over the `products` and
//! `product_tags` tables; [`SqliteHistory`] implements [`HistoryStore`] over
//! `chat_history`. Like a document store, the catalog only answers queries on
//! indexed fields (`nameLowercase` ranges, `tags` intersections) and reports
//! anything else as a missing index.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use shopbot_core::models::{Message, Product};
use shopbot_core::store::{
    CatalogStore, HistoryStore, MAX_IN_VALUES, NAME_LOWERCASE_FIELD, PRODUCTS_COLLECTION,
    TAGS_FIELD,
};

const PRODUCT_COLUMNS: &str = "p.id AS id, p.name AS name, p.name_lowercase AS name_lowercase, \
    p.description AS description, p.price_inr AS price_inr, p.stock AS stock, p.sku AS sku";

/// SQLite implementation of [`CatalogStore`].
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or replace a product and its tag set.
    pub async fn upsert_product(&self, product: &Product) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, name_lowercase, description, price_inr, stock, sku, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                name_lowercase = excluded.name_lowercase,
                description = excluded.description,
                price_inr = excluded.price_inr,
                stock = excluded.stock,
                sku = excluded.sku,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.name_lowercase)
        .bind(&product.description)
        .bind(product.price_inr)
        .bind(product.stock)
        .bind(&product.sku)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM product_tags WHERE product_id = ?")
            .bind(&product.id)
            .execute(&mut *tx)
            .await?;

        for (position, tag) in product.tags.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO product_tags (product_id, tag, position) VALUES (?, ?, ?)",
            )
            .bind(&product.id)
            .bind(tag)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn count_products(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn hydrate(&self, rows: Vec<SqliteRow>) -> Result<Vec<Product>> {
        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let tags: Vec<String> = sqlx::query_scalar(
                "SELECT tag FROM product_tags WHERE product_id = ? ORDER BY position ASC",
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?;
            products.push(Product {
                id,
                name: row.get("name"),
                name_lowercase: row.get("name_lowercase"),
                tags,
                description: row.get("description"),
                price_inr: row.get("price_inr"),
                stock: row.get("stock"),
                sku: row.get("sku"),
            });
        }
        Ok(products)
    }
}

fn check_collection(collection: &str) -> Result<()> {
    if collection != PRODUCTS_COLLECTION {
        bail!("unknown collection: {}", collection);
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
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

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE p.name_lowercase >= ? AND p.name_lowercase < ?
            ORDER BY p.name_lowercase ASC
            LIMIT ?
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(lower)
            .bind(upper)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
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
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            r#"
            SELECT DISTINCT {PRODUCT_COLUMNS}
            FROM products p
            JOIN product_tags t ON t.product_id = p.id
            WHERE t.tag IN ({placeholders})
            ORDER BY p.id ASC
            LIMIT ?
            "#
        );
        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value);
        }
        let rows = query.bind(limit as i64).fetch_all(&self.pool).await?;

        self.hydrate(rows).await
    }
}

/// SQLite implementation of [`HistoryStore`].
///
/// Each session's log is stored as a single JSON array.
#[derive(Clone)]
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn load(&self, session_id: &str) -> Result<Vec<Message>> {
        let json: Option<String> =
            sqlx::query_scalar("SELECT messages_json FROM chat_history WHERE session_id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        match json {
            Some(json) => serde_json::from_str(&json)
                .with_context(|| format!("corrupt history for session {}", session_id)),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, session_id: &str, messages: &[Message]) -> Result<()> {
        let json = serde_json::to_string(messages)?;
        sqlx::query(
            r#"
            INSERT INTO chat_history (session_id, messages_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                messages_json = excluded.messages_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(json)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
