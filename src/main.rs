use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront::app::{self, AppState, Dependencies};
use storefront::config::{AppConfig, Config};
use storefront::middleware::{self, RateLimitMiddleware, RateLimiter};
use storefront::modules::carts::MySqlCartRepository;
use storefront::modules::orders::{MySqlOrderRepository, OrderRepository};
use storefront::modules::payments::{StripeProvider, WebhookHandler};
use storefront::modules::products::{MySqlProductRepository, ProductCache, RedisProductCache};
use storefront::modules::users::{MySqlUserRepository, TokenService};

fn init_tracing(app: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("storefront={},actix_web=info", app.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if app.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config.app);

    tracing::info!("Starting storefront API");
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    let product_cache: Option<Arc<dyn ProductCache>> = match &config.cache.redis_url {
        Some(url) => match RedisProductCache::connect(url).await {
            Ok(cache) => {
                tracing::info!("Product cache enabled");
                Some(Arc::new(cache))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, serving catalog uncached");
                None
            }
        },
        None => None,
    };

    let orders: Arc<dyn OrderRepository> = Arc::new(MySqlOrderRepository::new(db_pool.clone()));
    let webhooks = WebhookHandler::new(orders.clone(), config.payments.webhook_secret.clone())
        .context("Webhook handler cannot start")?;

    let state = AppState::new(Dependencies {
        users: Arc::new(MySqlUserRepository::new(db_pool.clone())),
        products: Arc::new(MySqlProductRepository::new(db_pool.clone())),
        carts: Arc::new(MySqlCartRepository::new(db_pool.clone())),
        orders,
        product_cache,
        payment_provider: Arc::new(StripeProvider::new(
            config.payments.stripe_secret_key.clone(),
            config.payments.api_base.clone(),
        )),
        tokens: TokenService::new(config.security.jwt_secret.reveal()),
        webhooks,
        currency: config.payments.currency.clone(),
    });

    let limiter = Arc::new(RateLimiter::with_eviction(
        config.security.rate_limit_requests,
        config.security.rate_limit_window(),
    ));

    tracing::info!(
        limit = limiter.limit(),
        window_secs = limiter.window().as_secs(),
        "Rate limiter started"
    );

    let bind_address = config.server.bind_address();
    let server_limiter = limiter.clone();
    let server = HttpServer::new(move || {
        let state = state.clone();

        App::new()
            .wrap(app::cors())
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(middleware::json_config())
            .app_data(middleware::query_config())
            .app_data(middleware::path_config())
            .service(
                web::scope("/api")
                    .wrap(RateLimitMiddleware::new(server_limiter.clone()))
                    .configure(|cfg| state.configure(cfg)),
            )
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;

    limiter.shutdown();
    tracing::info!("Server stopped");

    Ok(())
}
