// Users module: registration, login and bearer tokens

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{AuthResponse, User};
pub use repositories::{MySqlUserRepository, UserRepository};
pub use services::{AuthService, Claims, TokenService};
