pub mod carts;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;
