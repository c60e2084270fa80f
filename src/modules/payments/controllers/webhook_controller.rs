use actix_web::{web, HttpRequest, HttpResponse};

use crate::modules::payments::services::{WebhookError, WebhookHandler, MAX_PAYLOAD_BYTES};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// POST /webhook/stripe
///
/// 200 with an empty body once the event is verified and parsed, including
/// events for unknown orders and unhandled types. 400 for bad signatures or
/// payloads, 500 when the order update could not be stored.
async fn stripe_webhook(
    req: HttpRequest,
    body: web::Bytes,
    handler: web::Data<WebhookHandler>,
) -> Result<HttpResponse, WebhookError> {
    let signature = extract_signature(&req);
    handler.handle_event(&body, signature).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Empty when the header is absent; verification reports it
fn extract_signature(req: &HttpRequest) -> &str {
    req.headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
}

pub fn configure(cfg: &mut web::ServiceConfig, handler: web::Data<WebhookHandler>) {
    cfg.service(
        web::scope("/webhook")
            .app_data(handler)
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .route("/stripe", web::post().to(stripe_webhook)),
    );
}
