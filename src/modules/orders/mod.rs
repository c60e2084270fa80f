// Orders module: checkout and order history

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Order, OrderStatus, PaymentStateUpdate, PaymentStatus};
pub use repositories::{MySqlOrderRepository, OrderRepository};
pub use services::OrderService;
