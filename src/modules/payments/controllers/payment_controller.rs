use actix_web::{web, HttpResponse};

use crate::core::{response, AppError};
use crate::middleware::{AuthenticatedUser, JwtAuth};
use crate::modules::payments::models::CreateIntentRequest;
use crate::modules::payments::services::PaymentService;

/// POST /payment/create-intent
async fn create_intent(
    service: web::Data<PaymentService>,
    user: AuthenticatedUser,
    request: web::Json<CreateIntentRequest>,
) -> Result<HttpResponse, AppError> {
    let intent = service
        .create_intent(user.user_id, request.order_id)
        .await?;
    Ok(response::ok(intent))
}

pub fn configure(cfg: &mut web::ServiceConfig, service: web::Data<PaymentService>, auth: JwtAuth) {
    cfg.service(
        web::scope("/payment")
            .app_data(service)
            .wrap(auth)
            .route("/create-intent", web::post().to(create_intent)),
    );
}
