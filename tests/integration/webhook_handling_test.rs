// Payment webhook reconciliation
//
// Signed provider events applied to orders held in the in-memory store,
// through the handler directly and through POST /api/webhook/stripe.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Utc;
use helpers::*;
use rust_decimal_macros::dec;
use serde_json::json;
use storefront::orders::{OrderStatus, PaymentStatus};
use storefront::payments::services::signature::SignatureError;
use storefront::payments::services::MAX_PAYLOAD_BYTES;
use storefront::payments::{WebhookError, WebhookOutcome};

const SUCCEEDED: &str = "payment_intent.succeeded";
const FAILED: &str = "payment_intent.payment_failed";
const CANCELED: &str = "payment_intent.canceled";

#[actix_web::test]
async fn test_succeeded_event_marks_order_paid() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(19.99));
    let handler = webhook_handler(&store);

    let payload = payment_event(SUCCEEDED, json!(order.id.to_string()));
    let outcome = handler.handle_event(&payload, &sign(&payload)).await.unwrap();

    assert_eq!(
        outcome,
        WebhookOutcome::Applied {
            order_id: order.id,
            payment_status: PaymentStatus::Succeeded
        }
    );

    let updated = store.order(order.id).unwrap();
    assert_eq!(updated.status, OrderStatus::Paid);
    assert_eq!(updated.payment_status, Some(PaymentStatus::Succeeded));
    assert_eq!(updated.payment_intent_id.as_deref(), Some("pi_test_123"));
}

#[actix_web::test]
async fn test_redelivered_event_is_idempotent() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(19.99));
    let handler = webhook_handler(&store);

    let payload = payment_event(SUCCEEDED, json!(order.id));
    let header = sign(&payload);

    handler.handle_event(&payload, &header).await.unwrap();
    let first = store.order(order.id).unwrap();

    handler.handle_event(&payload, &header).await.unwrap();
    let second = store.order(order.id).unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.payment_status, second.payment_status);
    assert_eq!(first.payment_intent_id, second.payment_intent_id);
    assert_eq!(second.status, OrderStatus::Paid);
}

#[actix_web::test]
async fn test_failed_event_keeps_order_pending() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(5.00));
    let handler = webhook_handler(&store);

    let payload = payment_event(FAILED, json!(order.id.to_string()));
    handler.handle_event(&payload, &sign(&payload)).await.unwrap();

    let updated = store.order(order.id).unwrap();
    assert_eq!(updated.status, OrderStatus::Pending);
    assert_eq!(updated.payment_status, Some(PaymentStatus::Failed));
    assert_eq!(updated.payment_intent_id, None);
}

#[actix_web::test]
async fn test_canceled_event_cancels_order() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(5.00));
    let handler = webhook_handler(&store);

    let payload = payment_event(CANCELED, json!(order.id.to_string()));
    handler.handle_event(&payload, &sign(&payload)).await.unwrap();

    let updated = store.order(order.id).unwrap();
    assert_eq!(updated.status, OrderStatus::Canceled);
    assert_eq!(updated.payment_status, Some(PaymentStatus::Canceled));
}

#[actix_web::test]
async fn test_tampered_payload_changes_nothing() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(5.00));
    let handler = webhook_handler(&store);

    let signed = payment_event(FAILED, json!(order.id.to_string()));
    let header = sign(&signed);
    let forged = payment_event(SUCCEEDED, json!(order.id.to_string()));

    let err = handler.handle_event(&forged, &header).await.unwrap_err();

    assert!(matches!(
        err,
        WebhookError::SignatureInvalid(SignatureError::Mismatch)
    ));
    assert_eq!(store.payment_updates(), 0);
    assert_eq!(store.order(order.id).unwrap().status, OrderStatus::Pending);
}

#[actix_web::test]
async fn test_replayed_old_delivery_rejected() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(5.00));
    let handler = webhook_handler(&store);

    let payload = payment_event(SUCCEEDED, json!(order.id.to_string()));
    let header = sign_at(&payload, Utc::now().timestamp() - 3600);

    let err = handler.handle_event(&payload, &header).await.unwrap_err();
    assert!(matches!(
        err,
        WebhookError::SignatureInvalid(SignatureError::TimestampOutOfTolerance)
    ));
    assert_eq!(store.payment_updates(), 0);
}

#[actix_web::test]
async fn test_oversized_payload_rejected_before_verification() {
    let store = MemoryStore::new();
    let handler = webhook_handler(&store);

    let payload = vec![b' '; MAX_PAYLOAD_BYTES + 1];
    let err = handler.handle_event(&payload, "").await.unwrap_err();

    assert!(matches!(err, WebhookError::PayloadTooLarge { .. }));
}

#[actix_web::test]
async fn test_unknown_event_type_ignored() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(5.00));
    let handler = webhook_handler(&store);

    let payload = payment_event("charge.refunded", json!(order.id.to_string()));
    let outcome = handler.handle_event(&payload, &sign(&payload)).await.unwrap();

    assert_eq!(
        outcome,
        WebhookOutcome::Ignored {
            event_type: "charge.refunded".to_string()
        }
    );
    assert_eq!(store.payment_updates(), 0);
}

#[actix_web::test]
async fn test_unknown_order_acknowledged() {
    let store = MemoryStore::new();
    let handler = webhook_handler(&store);

    let payload = payment_event(SUCCEEDED, json!("9999"));
    let outcome = handler.handle_event(&payload, &sign(&payload)).await.unwrap();

    assert_eq!(outcome, WebhookOutcome::OrderNotFound { order_id: 9999 });
}

#[actix_web::test]
async fn test_missing_metadata_rejected() {
    let store = MemoryStore::new();
    let handler = webhook_handler(&store);

    let payload = payment_event_without_metadata(SUCCEEDED);
    let err = handler.handle_event(&payload, &sign(&payload)).await.unwrap_err();

    assert!(matches!(err, WebhookError::MetadataMissing));
    assert!(!err.is_retryable());
}

#[actix_web::test]
async fn test_malformed_order_id_rejected() {
    let store = MemoryStore::new();
    let handler = webhook_handler(&store);

    let payload = payment_event(SUCCEEDED, json!("order-12"));
    let err = handler.handle_event(&payload, &sign(&payload)).await.unwrap_err();

    assert!(matches!(err, WebhookError::MetadataMalformed(_)));
}

#[actix_web::test]
async fn test_store_failure_is_retryable() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(5.00));
    let handler = webhook_handler(&store);
    store.fail_payment_updates(true);

    let payload = payment_event(SUCCEEDED, json!(order.id.to_string()));
    let err = handler.handle_event(&payload, &sign(&payload)).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(err, WebhookError::Persistence { order_id, .. } if order_id == order.id));

    // The provider's redelivery lands once the store recovers
    store.fail_payment_updates(false);
    handler.handle_event(&payload, &sign(&payload)).await.unwrap();
    assert_eq!(store.order(order.id).unwrap().status, OrderStatus::Paid);
}

#[actix_web::test]
async fn test_http_delivery_status_codes() {
    let store = MemoryStore::new();
    let order = store.seed_order(1, dec!(42.00));
    let app = spawn_test_app(&store, FakeProvider::new()).await;

    // Verified event: empty 200
    let payload = payment_event(SUCCEEDED, json!(order.id.to_string()));
    let req = test::TestRequest::post()
        .uri("/api/webhook/stripe")
        .insert_header(("Stripe-Signature", sign(&payload)))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(test::read_body(resp).await.is_empty());
    assert_eq!(store.order(order.id).unwrap().status, OrderStatus::Paid);

    // Missing signature: plain-text 400
    let payload = payment_event(CANCELED, json!(order.id.to_string()));
    let req = test::TestRequest::post()
        .uri("/api/webhook/stripe")
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.order(order.id).unwrap().status, OrderStatus::Paid);

    // Unknown order: acknowledged so the provider stops retrying
    let payload = payment_event(SUCCEEDED, json!("123456"));
    let req = test::TestRequest::post()
        .uri("/api/webhook/stripe")
        .insert_header(("Stripe-Signature", sign(&payload)))
        .set_payload(payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Store outage: 500 so the provider redelivers
    store.fail_payment_updates(true);
    let payload = payment_event(FAILED, json!(order.id.to_string()));
    let req = test::TestRequest::post()
        .uri("/api/webhook/stripe")
        .insert_header(("Stripe-Signature", sign(&payload)))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"Error processing payment event");
}

#[actix_web::test]
async fn test_http_oversized_body_rejected() {
    let store = MemoryStore::new();
    let app = spawn_test_app(&store, FakeProvider::new()).await;

    let req = test::TestRequest::post()
        .uri("/api/webhook/stripe")
        .insert_header(("Stripe-Signature", "t=1,v1=00"))
        .set_payload(vec![b'x'; MAX_PAYLOAD_BYTES + 1])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(store.payment_updates(), 0);
}
