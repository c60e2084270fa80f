pub mod product_cache;
pub mod product_service;

pub use product_cache::{ProductCache, RedisProductCache};
pub use product_service::ProductService;
