mod user;

pub use user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User, MIN_PASSWORD_LENGTH};
