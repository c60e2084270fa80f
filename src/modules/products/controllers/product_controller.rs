use actix_web::{web, HttpResponse};

use crate::core::{response, AppError};
use crate::modules::products::models::{ListProductsQuery, SearchQuery};
use crate::modules::products::services::ProductService;

/// GET /products
async fn list_products(
    service: web::Data<ProductService>,
    query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
    let page = service.list(query.into_inner()).await?;
    Ok(response::ok(page))
}

/// GET /products/{id}
async fn get_product(
    service: web::Data<ProductService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let product = service.get(path.into_inner()).await?;
    Ok(response::ok(product))
}

/// GET /products/search?q=
async fn search_products(
    service: web::Data<ProductService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let products = service.search(&query.q).await?;
    Ok(response::ok(products))
}

pub fn configure(cfg: &mut web::ServiceConfig, service: web::Data<ProductService>) {
    // /search is registered before /{id} so it is not parsed as an id
    cfg.service(
        web::scope("/products")
            .app_data(service)
            .route("", web::get().to(list_products))
            .route("/search", web::get().to(search_products))
            .route("/{id}", web::get().to(get_product)),
    );
}
