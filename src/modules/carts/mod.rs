// Carts module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{CartLine, CartView};
pub use repositories::{CartRepository, MySqlCartRepository};
pub use services::CartService;
