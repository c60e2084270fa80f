use super::Vars;
use crate::core::{AppError, Result};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub(crate) fn from_vars(vars: &Vars<'_>) -> Result<Self> {
        Ok(DatabaseConfig {
            url: vars.required("DATABASE_URL")?,
            max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", 25)?,
            min_connections: vars.parse_or("DATABASE_MIN_CONNECTIONS", 5)?,
        })
    }

    /// Create a MySQL connection pool
    pub async fn create_pool(&self) -> Result<MySqlPool> {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(300))
            .test_before_acquire(true)
            .connect(&self.url)
            .await
            .map_err(AppError::Database)
    }
}
