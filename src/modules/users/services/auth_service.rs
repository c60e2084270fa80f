use std::sync::Arc;

use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::users::models::{AuthResponse, LoginRequest, NewUser, RegisterRequest};
use crate::modules::users::repositories::UserRepository;
use crate::modules::users::services::{password, TokenService};

/// Registration, login and token refresh
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self { user_repo, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        request.validate()?;

        let email = request.normalized_email();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailExists);
        }

        let user = self
            .user_repo
            .create(&NewUser {
                email,
                password_hash: password::hash_password(&request.password)?,
                full_name: request.full_name.trim().to_string(),
            })
            .await?;

        info!(user_id = user.id, "User registered");

        Ok(AuthResponse {
            user_id: user.id,
            token: self.tokens.issue(user.id)?,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !password::verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(AuthResponse {
            user_id: user.id,
            token: self.tokens.issue(user.id)?,
        })
    }

    /// New token for a user that still exists
    pub async fn refresh(&self, user_id: i64) -> Result<AuthResponse> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::InvalidToken("User no longer exists".to_string()))?;

        Ok(AuthResponse {
            user_id: user.id,
            token: self.tokens.issue(user.id)?,
        })
    }
}
