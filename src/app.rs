//! Service graph and route table shared by the binary and the tests.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web};

use crate::middleware::JwtAuth;
use crate::modules::carts::{self, CartRepository, CartService};
use crate::modules::health;
use crate::modules::orders::{self, OrderRepository, OrderService};
use crate::modules::payments::{self, PaymentProvider, PaymentService, WebhookHandler};
use crate::modules::products::{self, ProductCache, ProductRepository, ProductService};
use crate::modules::users::{self, AuthService, TokenService, UserRepository};

/// Repositories and collaborators the services are built from
pub struct Dependencies {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub product_cache: Option<Arc<dyn ProductCache>>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub tokens: TokenService,
    pub webhooks: WebhookHandler,
    pub currency: String,
}

/// Handler state, cheap to clone into every worker
#[derive(Clone)]
pub struct AppState {
    pub auth: web::Data<AuthService>,
    pub products: web::Data<ProductService>,
    pub carts: web::Data<CartService>,
    pub orders: web::Data<OrderService>,
    pub payments: web::Data<PaymentService>,
    pub webhooks: web::Data<WebhookHandler>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(deps: Dependencies) -> Self {
        let mut product_service = ProductService::new(deps.products.clone());
        if let Some(cache) = deps.product_cache {
            product_service = product_service.with_cache(cache);
        }

        let order_service = Arc::new(OrderService::new(deps.orders.clone(), deps.carts.clone()));
        let payment_service =
            PaymentService::new(order_service.clone(), deps.payment_provider, deps.currency);

        Self {
            auth: web::Data::new(AuthService::new(deps.users, deps.tokens.clone())),
            products: web::Data::new(product_service),
            carts: web::Data::new(CartService::new(deps.carts, deps.products)),
            orders: web::Data::from(order_service),
            payments: web::Data::new(payment_service),
            webhooks: web::Data::new(deps.webhooks),
            tokens: deps.tokens,
        }
    }

    /// Mount every route below the caller's scope (normally `/api`)
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        let auth = JwtAuth::new(self.tokens.clone());

        health::controllers::configure(cfg);
        users::controllers::configure(cfg, self.auth.clone());
        products::controllers::configure(cfg, self.products.clone());
        payments::controllers::webhook_controller::configure(cfg, self.webhooks.clone());
        carts::controllers::configure(cfg, self.carts.clone(), auth.clone());
        orders::controllers::configure(cfg, self.orders.clone(), auth.clone());
        payments::controllers::payment_controller::configure(cfg, self.payments.clone(), auth);
    }
}

/// Permissive CORS for browser clients
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600)
}
