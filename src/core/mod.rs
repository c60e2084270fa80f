pub mod error;
pub mod response;
pub mod secret;
pub mod validation;

pub use error::{AppError, Result};
pub use response::ApiResponse;
pub use secret::Secret;
pub use validation::{FieldError, Validator};
