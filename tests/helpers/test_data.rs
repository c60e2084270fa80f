// Test Data Factory
//
// Builds signed provider events, bearer tokens and request payloads.

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use storefront::payments::services::signature::signature_header;
use storefront::users::TokenService;

/// Token signing secret shared by the test apps
pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long";

/// Webhook signing secret shared by the test apps
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

pub fn test_tokens() -> TokenService {
    TokenService::new(TEST_JWT_SECRET)
}

/// `Authorization` header value for `user_id`
pub fn bearer_for(user_id: i64) -> String {
    format!("Bearer {}", test_tokens().issue(user_id).unwrap())
}

/// Raw provider event body for a payment intent tied to `order_id`.
/// `order_id` is a JSON value so tests can send strings, numbers or junk.
pub fn payment_event(event_type: &str, order_id: Value) -> Vec<u8> {
    let event = json!({
        "id": format!("evt_{}", Uuid::new_v4().simple()),
        "type": event_type,
        "data": {
            "object": {
                "id": "pi_test_123",
                "amount": 1999,
                "currency": "usd",
                "status": "succeeded",
                "metadata": { "order_id": order_id }
            }
        }
    });
    serde_json::to_vec(&event).unwrap()
}

/// Event whose payment intent carries no metadata at all
pub fn payment_event_without_metadata(event_type: &str) -> Vec<u8> {
    let event = json!({
        "id": "evt_no_metadata",
        "type": event_type,
        "data": { "object": { "id": "pi_test_456", "amount": 500, "currency": "usd" } }
    });
    serde_json::to_vec(&event).unwrap()
}

/// Signature header over `payload` at `timestamp`
pub fn sign_at(payload: &[u8], timestamp: i64) -> String {
    signature_header(payload, TEST_WEBHOOK_SECRET, timestamp).unwrap()
}

/// Signature header over `payload` stamped now
pub fn sign(payload: &[u8]) -> String {
    sign_at(payload, Utc::now().timestamp())
}

pub fn add_to_cart_payload(product_id: i64, quantity: i32) -> Value {
    json!({ "product_id": product_id, "quantity": quantity })
}
