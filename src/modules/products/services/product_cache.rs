use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::warn;

use crate::core::{AppError, Result};
use crate::modules::products::models::Product;

/// Cached products expire after five minutes
pub const PRODUCT_TTL_SECS: u64 = 300;

/// Read-through cache for single products. Failures are misses.
#[async_trait]
pub trait ProductCache: Send + Sync {
    async fn get(&self, id: i64) -> Option<Product>;

    async fn put(&self, product: &Product);
}

fn cache_key(id: i64) -> String {
    format!("product:{}", id)
}

#[derive(Clone)]
pub struct RedisProductCache {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisProductCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::Configuration(format!("Invalid REDIS_URL: {}", e)))?;

        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| AppError::internal(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            conn,
            ttl_secs: PRODUCT_TTL_SECS,
        })
    }
}

#[async_trait]
impl ProductCache for RedisProductCache {
    async fn get(&self, id: i64) -> Option<Product> {
        let mut conn = self.conn.clone();

        let cached = match conn.get::<_, Option<String>>(cache_key(id)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(product_id = id, error = %e, "Product cache read failed");
                return None;
            }
        };

        cached.and_then(|json| match serde_json::from_str(&json) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(product_id = id, error = %e, "Discarding undecodable cached product");
                None
            }
        })
    }

    async fn put(&self, product: &Product) {
        let json = match serde_json::to_string(product) {
            Ok(json) => json,
            Err(e) => {
                warn!(product_id = product.id, error = %e, "Failed to encode product for cache");
                return;
            }
        };

        let mut conn = self.conn.clone();
        let stored: redis::RedisResult<()> = conn.set_ex(cache_key(product.id), json, self.ttl_secs).await;
        if let Err(e) = stored {
            warn!(product_id = product.id, error = %e, "Product cache write failed");
        }
    }
}
