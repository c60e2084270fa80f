use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::Result;
use crate::modules::carts::models::CartLine;

/// Data access for a user's cart. Every user has exactly one.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn lines(&self, user_id: i64) -> Result<Vec<CartLine>>;

    /// Quantity of `product_id` already in the cart, zero when absent
    async fn quantity_of(&self, user_id: i64, product_id: i64) -> Result<i32>;

    /// Add to an existing line or create one
    async fn add_item(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<()>;

    async fn clear(&self, user_id: i64) -> Result<()>;
}

#[derive(Clone)]
pub struct MySqlCartRepository {
    pool: MySqlPool,
}

impl MySqlCartRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Cart id for the user, created on first use
    async fn cart_id(&self, user_id: i64) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let id = cart_id_in_tx(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(id)
    }
}

/// Resolve (or lazily create) the cart row inside an open transaction
async fn cart_id_in_tx(tx: &mut Transaction<'_, MySql>, user_id: i64) -> Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let inserted = sqlx::query("INSERT INTO carts (user_id, created_at) VALUES (?, NOW())")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    Ok(inserted.last_insert_id() as i64)
}

#[async_trait]
impl CartRepository for MySqlCartRepository {
    async fn lines(&self, user_id: i64) -> Result<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT ci.id, ci.product_id, ci.quantity, p.name, p.price, p.image_url
            FROM cart_items ci
            JOIN carts c ON ci.cart_id = c.id
            JOIN products p ON ci.product_id = p.id
            WHERE c.user_id = ?
            ORDER BY ci.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn quantity_of(&self, user_id: i64, product_id: i64) -> Result<i32> {
        let quantity: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT ci.quantity
            FROM cart_items ci
            JOIN carts c ON ci.cart_id = c.id
            WHERE c.user_id = ? AND ci.product_id = ?
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    async fn add_item(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<()> {
        let cart_id = self.cart_id(user_id).await?;

        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE quantity = quantity + VALUES(quantity)
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            DELETE ci FROM cart_items ci
            JOIN carts c ON ci.cart_id = c.id
            WHERE c.user_id = ?
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
