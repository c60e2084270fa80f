use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::core::{response, AppError};
use crate::middleware::{AuthenticatedUser, JwtAuth};
use crate::modules::carts::models::AddToCartRequest;
use crate::modules::carts::services::CartService;

/// GET /cart
async fn get_cart(
    service: web::Data<CartService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let cart = service.get(user.user_id).await?;
    Ok(response::ok(cart))
}

/// POST /cart
async fn add_to_cart(
    service: web::Data<CartService>,
    user: AuthenticatedUser,
    request: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let cart = service.add(user.user_id, request.into_inner()).await?;
    Ok(response::ok(cart))
}

/// DELETE /cart/clear
async fn clear_cart(
    service: web::Data<CartService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    service.clear(user.user_id).await?;
    Ok(response::ok(json!({ "message": "Cart cleared" })))
}

pub fn configure(cfg: &mut web::ServiceConfig, service: web::Data<CartService>, auth: JwtAuth) {
    cfg.service(
        web::scope("/cart")
            .app_data(service)
            .wrap(auth)
            .route("", web::get().to(get_cart))
            .route("", web::post().to(add_to_cart))
            .route("/clear", web::delete().to(clear_cart)),
    );
}
