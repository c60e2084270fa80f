use async_trait::async_trait;
use chrono::Utc;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::orders::models::{
    NewOrder, Order, OrderItem, OrderRow, OrderStatus, PaymentStateUpdate,
};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically insert the order and its items, take the quantities out
    /// of stock and empty the user's cart. Nothing is written when any
    /// product lacks stock.
    async fn place(&self, order: &NewOrder) -> Result<Order>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>>;

    async fn items(&self, order_id: i64) -> Result<Vec<OrderItem>>;

    /// Newest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Order>>;

    /// Apply a payment outcome in a single statement. Returns `false` when
    /// no order has `order_id`. Reapplying the same update is harmless.
    async fn update_payment_state(&self, order_id: i64, update: &PaymentStateUpdate) -> Result<bool>;
}

#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: MySqlPool,
}

impl MySqlOrderRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn place(&self, order: &NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (user_id, total, status, created_at, updated_at)
            VALUES (?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(order.user_id)
        .bind(order.total)
        .bind(OrderStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        let order_id = inserted.last_insert_id() as i64;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, product_name, quantity, price, subtotal)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.subtotal())
            .execute(&mut *tx)
            .await?;

            let reserved = sqlx::query(
                "UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?",
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if reserved.rows_affected() == 0 {
                // Dropping the transaction rolls everything back
                return Err(AppError::InsufficientStock(format!(
                    "'{}' no longer has {} in stock",
                    item.product_name, item.quantity
                )));
            }
        }

        sqlx::query(
            r#"
            DELETE ci FROM cart_items ci
            JOIN carts c ON ci.cart_id = c.id
            WHERE c.user_id = ?
            "#,
        )
        .bind(order.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let now = Utc::now();
        Ok(Order {
            id: order_id,
            user_id: order.user_id,
            total: order.total,
            status: OrderStatus::Pending,
            payment_status: None,
            payment_intent_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, total, status, payment_status, payment_intent_id,
                   created_at, updated_at
            FROM orders
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, price, subtotal
            FROM order_items
            WHERE order_id = ?
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, total, status, payment_status, payment_intent_id,
                   created_at, updated_at
            FROM orders
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_payment_state(&self, order_id: i64, update: &PaymentStateUpdate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = COALESCE(?, status),
                payment_status = ?,
                payment_intent_id = COALESCE(?, payment_intent_id),
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.payment_status.as_str())
        .bind(update.payment_intent_id.as_deref())
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // A replay within the same second can change nothing; tell that
        // apart from a missing row
        let matching: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(matching > 0)
    }
}
