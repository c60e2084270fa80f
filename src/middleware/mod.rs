pub mod auth;
pub mod error_handler;
pub mod rate_limit;

pub use auth::{AuthenticatedUser, JwtAuth};
pub use error_handler::{json_config, path_config, query_config};
pub use rate_limit::{client_identity, RateLimitDecision, RateLimitMiddleware, RateLimiter};
