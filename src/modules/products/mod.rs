// Products module: catalog listing, lookup and search

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::Product;
pub use repositories::{MySqlProductRepository, ProductRepository};
pub use services::{ProductCache, ProductService, RedisProductCache};
