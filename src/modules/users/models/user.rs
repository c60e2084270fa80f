use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Result, Validator};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registered account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        v.required("email", &self.email)
            .email("email", &self.email)
            .max_length("email", &self.email, 255)
            .required("password", &self.password)
            .min_length("password", &self.password, MIN_PASSWORD_LENGTH)
            .required("full_name", &self.full_name)
            .max_length("full_name", &self.full_name, 255);
        v.finish()
    }

    /// Emails compare case-insensitively
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<()> {
        let mut v = Validator::new();
        v.required("email", &self.email)
            .required("password", &self.password);
        v.finish()
    }
}

/// Returned by register, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub user_id: i64,
    pub token: String,
}
