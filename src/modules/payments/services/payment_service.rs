use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::orders::{OrderService, OrderStatus};
use crate::modules::payments::models::CreateIntentResponse;
use crate::modules::payments::services::{IntentRequest, PaymentProvider};

/// Starts payments for orders
pub struct PaymentService {
    orders: Arc<OrderService>,
    provider: Arc<dyn PaymentProvider>,
    currency: String,
}

impl PaymentService {
    pub fn new(
        orders: Arc<OrderService>,
        provider: Arc<dyn PaymentProvider>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            provider,
            currency: currency.into(),
        }
    }

    pub async fn create_intent(&self, user_id: i64, order_id: i64) -> Result<CreateIntentResponse> {
        let order = self.orders.owned_order(user_id, order_id).await?;

        match order.status {
            OrderStatus::Paid => return Err(AppError::AlreadyPaid),
            OrderStatus::Canceled => {
                return Err(AppError::validation("Order has been canceled"));
            }
            OrderStatus::Pending => {}
        }

        let request = IntentRequest {
            order_id: order.id,
            user_id,
            amount: to_minor_units(order.total)?,
            currency: self.currency.clone(),
            idempotency_key: format!("order-{}-{}", order.id, uuid::Uuid::new_v4()),
        };

        let intent = self.provider.create_intent(&request).await?;

        info!(
            order_id = order.id,
            provider = self.provider.name(),
            payment_intent = %intent.id,
            amount = intent.amount,
            "Payment intent created"
        );

        Ok(CreateIntentResponse {
            client_secret: intent.client_secret,
            amount: intent.amount,
        })
    }
}

/// Whole cents, rounding half away from zero
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::internal(format!("Amount {} out of range", amount)))
}
