use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::carts::CartRepository;
use crate::modules::orders::models::{NewOrder, NewOrderItem, Order, OrderDetail, PlacedOrder};
use crate::modules::orders::repositories::OrderRepository;

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    carts: Arc<dyn CartRepository>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>, carts: Arc<dyn CartRepository>) -> Self {
        Self { orders, carts }
    }

    /// Turn the caller's cart into a pending order
    pub async fn place(&self, user_id: i64) -> Result<PlacedOrder> {
        let lines = self.carts.lines(user_id).await?;
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let items: Vec<NewOrderItem> = lines
            .into_iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                product_name: line.name,
                quantity: line.quantity,
                price: line.price,
            })
            .collect();
        let total: Decimal = items.iter().map(NewOrderItem::subtotal).sum();

        let order = self
            .orders
            .place(&NewOrder {
                user_id,
                total,
                items,
            })
            .await?;

        info!(order_id = order.id, user_id, total = %order.total, "Order placed");

        Ok(PlacedOrder {
            id: order.id,
            total: order.total,
            status: order.status,
        })
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Order>> {
        self.orders.list_for_user(user_id).await
    }

    /// The order if it exists and belongs to `user_id`
    pub async fn owned_order(&self, user_id: i64, order_id: i64) -> Result<Order> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))?;

        if order.user_id != user_id {
            return Err(AppError::forbidden("Not your order"));
        }

        Ok(order)
    }

    pub async fn get(&self, user_id: i64, order_id: i64) -> Result<OrderDetail> {
        let order = self.owned_order(user_id, order_id).await?;
        let items = self.orders.items(order.id).await?;

        Ok(OrderDetail { order, items })
    }
}
