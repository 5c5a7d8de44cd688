//! Idempotent schema creation.
//!
//! | Table | Contents |
//! |-------|----------|
//! | `products` | One row per catalog product |
//! | `product_tags` | `(product_id, tag)` pairs backing tag queries |
//! | `chat_history` | Persisted message log per session, as JSON |

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index on an open pool.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_lowercase TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price_inr REAL,
            stock INTEGER,
            sku TEXT,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_tags (
            product_id TEXT NOT NULL,
            tag TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (product_id, tag),
            FOREIGN KEY (product_id) REFERENCES products(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_history (
            session_id TEXT PRIMARY KEY,
            messages_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Prefix range queries order by name_lowercase
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_products_name_lowercase ON products(name_lowercase)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_product_tags_tag ON product_tags(tag)")
        .execute(pool)
        .await?;

    Ok(())
}
