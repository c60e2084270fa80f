//! Storefront e-commerce backend library
//!
//! Catalog, accounts, carts, orders and provider-backed payments, served
//! over actix-web behind a per-client rate limiter.

pub mod app;
pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

pub use modules::carts;
pub use modules::orders;
pub use modules::payments;
pub use modules::products;
pub use modules::users;
