use actix_web::{web, HttpResponse};

use crate::core::{response, AppError};
use crate::middleware::{AuthenticatedUser, JwtAuth};
use crate::modules::orders::services::OrderService;

/// POST /orders
async fn create_order(
    service: web::Data<OrderService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let order = service.place(user.user_id).await?;
    Ok(response::created(order))
}

/// GET /orders
async fn list_orders(
    service: web::Data<OrderService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let orders = service.list(user.user_id).await?;
    Ok(response::ok(orders))
}

/// GET /orders/{id}
async fn get_order(
    service: web::Data<OrderService>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order = service.get(user.user_id, path.into_inner()).await?;
    Ok(response::ok(order))
}

pub fn configure(cfg: &mut web::ServiceConfig, service: web::Data<OrderService>, auth: JwtAuth) {
    cfg.service(
        web::scope("/orders")
            .app_data(service)
            .wrap(auth)
            .route("", web::post().to(create_order))
            .route("", web::get().to(list_orders))
            .route("/{id}", web::get().to(get_order)),
    );
}
