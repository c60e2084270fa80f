// Payment intent creation
//
// POST /api/payment/create-intent against a recording provider: amounts in
// minor units, ownership, paid and canceled orders, provider failures.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::test;
use helpers::*;
use rust_decimal_macros::dec;
use serde_json::json;
use storefront::orders::{OrderRepository, OrderStatus, PaymentStateUpdate, PaymentStatus};

fn create_intent(order_id: i64, user_id: i64) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/payment/create-intent")
        .insert_header(("Authorization", bearer_for(user_id).as_str()))
        .set_json(json!({ "order_id": order_id }))
        .to_request()
}

#[actix_web::test]
async fn test_intent_created_in_minor_units() {
    let store = MemoryStore::new();
    let order = store.seed_order(7, dec!(44.75));
    let provider = FakeProvider::new();
    let app = spawn_test_app(&store, provider.clone()).await;

    let body = read_json(
        test::call_service(&app, create_intent(order.id, 7)).await,
        StatusCode::OK,
    )
    .await;
    let data = assert_success(&body);
    assert_eq!(data["amount"], 4475);
    assert_eq!(data["client_secret"], "pi_test_1_secret_abc");

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].order_id, order.id);
    assert_eq!(requests[0].user_id, 7);
    assert_eq!(requests[0].amount, 4475);
    assert_eq!(requests[0].currency, "usd");
    assert!(requests[0]
        .idempotency_key
        .starts_with(&format!("order-{}-", order.id)));

    // Creating an intent does not touch the order
    assert_eq!(store.order(order.id).unwrap().status, OrderStatus::Pending);
}

#[actix_web::test]
async fn test_half_cent_rounds_away_from_zero() {
    let store = MemoryStore::new();
    let order = store.seed_order(7, dec!(10.005));
    let provider = FakeProvider::new();
    let app = spawn_test_app(&store, provider.clone()).await;

    read_json(
        test::call_service(&app, create_intent(order.id, 7)).await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(provider.requests()[0].amount, 1001);
}

#[actix_web::test]
async fn test_paid_order_rejected() {
    let store = MemoryStore::new();
    let order = store.seed_order(7, dec!(20.00));
    store
        .update_payment_state(
            order.id,
            &PaymentStateUpdate {
                status: Some(OrderStatus::Paid),
                payment_status: PaymentStatus::Succeeded,
                payment_intent_id: Some("pi_done".to_string()),
            },
        )
        .await
        .unwrap();
    let provider = FakeProvider::new();
    let app = spawn_test_app(&store, provider.clone()).await;

    let body = read_json(
        test::call_service(&app, create_intent(order.id, 7)).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_error_code(&body, "ALREADY_PAID");
    assert!(provider.requests().is_empty());
}

#[actix_web::test]
async fn test_canceled_order_rejected() {
    let store = MemoryStore::new();
    let order = store.seed_order(7, dec!(20.00));
    store
        .update_payment_state(
            order.id,
            &PaymentStateUpdate {
                status: Some(OrderStatus::Canceled),
                payment_status: PaymentStatus::Canceled,
                payment_intent_id: None,
            },
        )
        .await
        .unwrap();
    let app = spawn_test_app(&store, FakeProvider::new()).await;

    let body = read_json(
        test::call_service(&app, create_intent(order.id, 7)).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_error_code(&body, "VALIDATION_ERROR");
}

#[actix_web::test]
async fn test_other_users_order_forbidden() {
    let store = MemoryStore::new();
    let order = store.seed_order(7, dec!(20.00));
    let provider = FakeProvider::new();
    let app = spawn_test_app(&store, provider.clone()).await;

    let body = read_json(
        test::call_service(&app, create_intent(order.id, 8)).await,
        StatusCode::FORBIDDEN,
    )
    .await;
    assert_error_code(&body, "FORBIDDEN");
    assert!(provider.requests().is_empty());
}

#[actix_web::test]
async fn test_unknown_order_not_found() {
    let store = MemoryStore::new();
    let app = spawn_test_app(&store, FakeProvider::new()).await;

    let body = read_json(
        test::call_service(&app, create_intent(31337, 7)).await,
        StatusCode::NOT_FOUND,
    )
    .await;
    assert_error_code(&body, "NOT_FOUND");
}

#[actix_web::test]
async fn test_provider_failure_is_bad_gateway() {
    let store = MemoryStore::new();
    let order = store.seed_order(7, dec!(20.00));
    let app = spawn_test_app(&store, FakeProvider::failing()).await;

    let body = read_json(
        test::call_service(&app, create_intent(order.id, 7)).await,
        StatusCode::BAD_GATEWAY,
    )
    .await;
    assert_error_code(&body, "PAYMENT_FAILED");
    assert_eq!(body["error"]["message"], "Failed to create payment");
}

#[actix_web::test]
async fn test_intent_requires_token() {
    let store = MemoryStore::new();
    let order = store.seed_order(7, dec!(20.00));
    let app = spawn_test_app(&store, FakeProvider::new()).await;

    let req = test::TestRequest::post()
        .uri("/api/payment/create-intent")
        .set_json(json!({ "order_id": order.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_paid_via_webhook_then_intent_rejected() {
    let store = MemoryStore::new();
    let order = store.seed_order(7, dec!(20.00));
    let app = spawn_test_app(&store, FakeProvider::new()).await;

    let payload = payment_event("payment_intent.succeeded", json!(order.id.to_string()));
    let req = test::TestRequest::post()
        .uri("/api/webhook/stripe")
        .insert_header(("Stripe-Signature", sign(&payload)))
        .set_payload(payload)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let body = read_json(
        test::call_service(&app, create_intent(order.id, 7)).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_error_code(&body, "ALREADY_PAID");
}
