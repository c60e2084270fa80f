use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::modules::payments::services::webhook_handler::WebhookError;

pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";
pub const EVENT_PAYMENT_CANCELED: &str = "payment_intent.canceled";

/// Provider event as delivered on the wire
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventData {
    pub object: Value,
}

/// The parts of a provider payment intent the reconciliation needs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl PaymentIntent {
    /// `metadata.order_id`, as a string or an integer
    pub fn order_id(&self) -> Result<i64, WebhookError> {
        match self.metadata.get("order_id") {
            None | Some(Value::Null) => Err(WebhookError::MetadataMissing),
            Some(Value::String(raw)) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| WebhookError::MetadataMalformed(raw.clone())),
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| WebhookError::MetadataMalformed(n.to_string())),
            Some(other) => Err(WebhookError::MetadataMalformed(other.to_string())),
        }
    }
}

/// Closed set of payment events the store reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    Succeeded(PaymentIntent),
    Failed(PaymentIntent),
    Canceled(PaymentIntent),
    /// Anything else; acknowledged and ignored
    Unknown { event_type: String },
}

impl PaymentEvent {
    pub fn event_type(&self) -> &str {
        match self {
            PaymentEvent::Succeeded(_) => EVENT_PAYMENT_SUCCEEDED,
            PaymentEvent::Failed(_) => EVENT_PAYMENT_FAILED,
            PaymentEvent::Canceled(_) => EVENT_PAYMENT_CANCELED,
            PaymentEvent::Unknown { event_type } => event_type,
        }
    }
}

impl TryFrom<ProviderEvent> for PaymentEvent {
    type Error = WebhookError;

    fn try_from(event: ProviderEvent) -> Result<Self, Self::Error> {
        let intent = |object: Value| {
            serde_json::from_value::<PaymentIntent>(object)
                .map_err(|e| WebhookError::Parse(format!("invalid payment intent: {}", e)))
        };

        match event.event_type.as_str() {
            EVENT_PAYMENT_SUCCEEDED => Ok(PaymentEvent::Succeeded(intent(event.data.object)?)),
            EVENT_PAYMENT_FAILED => Ok(PaymentEvent::Failed(intent(event.data.object)?)),
            EVENT_PAYMENT_CANCELED => Ok(PaymentEvent::Canceled(intent(event.data.object)?)),
            _ => Ok(PaymentEvent::Unknown {
                event_type: event.event_type,
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIntentRequest {
    pub order_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateIntentResponse {
    pub client_secret: String,
    /// Smallest currency unit
    pub amount: i64,
}
