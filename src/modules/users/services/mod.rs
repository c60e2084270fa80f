pub mod auth_service;
pub mod password;
pub mod token;

pub use auth_service::AuthService;
pub use token::{Claims, TokenService};
