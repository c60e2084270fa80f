use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::Result;
use crate::modules::products::models::Product;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>>;

    async fn count(&self) -> Result<i64>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>>;

    /// Case-insensitive substring match on name or description
    async fn search(&self, term: &str, limit: i64) -> Result<Vec<Product>>;
}

#[derive(Clone)]
pub struct MySqlProductRepository {
    pool: MySqlPool,
}

impl MySqlProductRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl ProductRepository for MySqlProductRepository {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, category, stock, image_url, created_at
            FROM products
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn count(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, category, stock, image_url, created_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn search(&self, term: &str, limit: i64) -> Result<Vec<Product>> {
        let pattern = like_pattern(term);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, category, stock, image_url, created_at
            FROM products
            WHERE LOWER(name) LIKE ? OR LOWER(description) LIKE ?
            ORDER BY name
            LIMIT ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}
