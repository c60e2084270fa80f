use std::sync::Arc;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::core::{AppError, Secret};
use crate::modules::orders::{OrderRepository, OrderStatus, PaymentStateUpdate, PaymentStatus};
use crate::modules::payments::models::{PaymentEvent, ProviderEvent};
use crate::modules::payments::services::signature::{
    verify_signature, SignatureError, SIGNATURE_TOLERANCE_SECS,
};

/// Largest webhook body accepted, checked before anything else
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Failures of a single webhook delivery
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("webhook secret is not configured")]
    SecretMissing,

    #[error("signature verification failed: {0}")]
    SignatureInvalid(#[from] SignatureError),

    #[error("invalid event payload: {0}")]
    Parse(String),

    #[error("order_id missing from payment metadata")]
    MetadataMissing,

    #[error("order_id '{0}' is not an integer")]
    MetadataMalformed(String),

    #[error("failed to update order {order_id}: {source}")]
    Persistence {
        order_id: i64,
        #[source]
        source: AppError,
    },
}

impl WebhookError {
    /// Only store failures are worth a redelivery; everything else will
    /// fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Persistence { .. })
    }

    fn body(&self) -> String {
        match self {
            WebhookError::Persistence { .. } => "Error processing payment event".to_string(),
            WebhookError::SecretMissing => "Webhook secret not configured".to_string(),
            other => other.to_string(),
        }
    }
}

/// Plain-text responses, which is what the provider expects
impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            WebhookError::SignatureInvalid(_)
            | WebhookError::Parse(_)
            | WebhookError::MetadataMissing
            | WebhookError::MetadataMalformed(_) => StatusCode::BAD_REQUEST,
            WebhookError::SecretMissing | WebhookError::Persistence { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.body())
    }
}

/// What a delivery did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied {
        order_id: i64,
        payment_status: PaymentStatus,
    },
    /// Valid event for an order this store does not have
    OrderNotFound { order_id: i64 },
    /// Event type the store does not act on
    Ignored { event_type: String },
}

/// Verifies provider deliveries and applies them to orders.
///
/// Updates are plain assignments executed as one statement per order, so a
/// redelivered event lands on the same final state and concurrent
/// deliveries for one order are serialized by the store.
pub struct WebhookHandler {
    orders: Arc<dyn OrderRepository>,
    secret: Secret<String>,
    tolerance_secs: i64,
}

impl WebhookHandler {
    /// Fails with `SecretMissing` for an empty secret
    pub fn new(orders: Arc<dyn OrderRepository>, secret: Secret<String>) -> Result<Self, WebhookError> {
        if secret.reveal().trim().is_empty() {
            return Err(WebhookError::SecretMissing);
        }

        Ok(Self {
            orders,
            secret,
            tolerance_secs: SIGNATURE_TOLERANCE_SECS,
        })
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    pub async fn handle_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome, WebhookError> {
        self.handle_event_at(payload, signature_header, Utc::now().timestamp())
            .await
    }

    /// `handle_event` with an explicit clock reading in unix seconds
    pub async fn handle_event_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<WebhookOutcome, WebhookError> {
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(WebhookError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_BYTES,
            });
        }

        verify_signature(
            payload,
            signature_header,
            self.secret.reveal(),
            now,
            self.tolerance_secs,
        )
        .map_err(|e| {
            warn!(error = %e, "Rejected webhook signature");
            e
        })?;

        let envelope: ProviderEvent =
            serde_json::from_slice(payload).map_err(|e| WebhookError::Parse(e.to_string()))?;
        let event_id = envelope.id.clone();
        let event = PaymentEvent::try_from(envelope)?;

        let (intent, update) = match event {
            PaymentEvent::Succeeded(intent) => {
                let update = PaymentStateUpdate {
                    status: Some(OrderStatus::Paid),
                    payment_status: PaymentStatus::Succeeded,
                    payment_intent_id: Some(intent.id.clone()),
                };
                (intent, update)
            }
            PaymentEvent::Failed(intent) => (
                intent,
                PaymentStateUpdate {
                    status: None,
                    payment_status: PaymentStatus::Failed,
                    payment_intent_id: None,
                },
            ),
            PaymentEvent::Canceled(intent) => (
                intent,
                PaymentStateUpdate {
                    status: Some(OrderStatus::Canceled),
                    payment_status: PaymentStatus::Canceled,
                    payment_intent_id: None,
                },
            ),
            PaymentEvent::Unknown { event_type } => {
                info!(event_id = %event_id, event_type = %event_type, "Ignoring unhandled webhook event");
                return Ok(WebhookOutcome::Ignored { event_type });
            }
        };

        let order_id = intent.order_id()?;

        match self.orders.update_payment_state(order_id, &update).await {
            Ok(true) => {
                info!(
                    event_id = %event_id,
                    order_id = order_id,
                    payment_intent = %intent.id,
                    payment_status = %update.payment_status,
                    "Applied payment event"
                );
                Ok(WebhookOutcome::Applied {
                    order_id,
                    payment_status: update.payment_status,
                })
            }
            Ok(false) => {
                warn!(
                    event_id = %event_id,
                    order_id = order_id,
                    payment_intent = %intent.id,
                    "Payment event references an unknown order"
                );
                Ok(WebhookOutcome::OrderNotFound { order_id })
            }
            Err(source) => {
                error!(
                    event_id = %event_id,
                    order_id = order_id,
                    error = %source,
                    "Failed to persist payment event"
                );
                Err(WebhookError::Persistence { order_id, source })
            }
        }
    }
}
