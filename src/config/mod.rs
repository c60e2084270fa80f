use crate::core::{AppError, Result, Secret};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Minimum accepted length for the token signing secret
const MIN_JWT_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub security: SecurityConfig,
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// `LOG_FORMAT=json` switches to JSON log lines
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Absent means the catalog is served uncached
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: Secret<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
}

impl SecurityConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    pub stripe_secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub api_base: String,
    pub currency: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let config = Config {
            app: AppConfig {
                env: vars.or("APP_ENV", "development"),
                log_level: vars.or("LOG_LEVEL", "debug"),
                log_json: vars.or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            },
            server: ServerConfig::from_vars(&vars)?,
            database: DatabaseConfig::from_vars(&vars)?,
            cache: CacheConfig {
                redis_url: vars.optional("REDIS_URL"),
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(vars.required("JWT_SECRET")?),
                rate_limit_requests: vars.parse_or("RATE_LIMIT_REQUESTS", 100)?,
                rate_limit_window_secs: vars.parse_or("RATE_LIMIT_WINDOW_SECS", 60)?,
            },
            payments: PaymentsConfig {
                stripe_secret_key: Secret::new(vars.required("STRIPE_SECRET_KEY")?),
                webhook_secret: Secret::new(vars.required("STRIPE_WEBHOOK_SECRET")?),
                api_base: vars.or("STRIPE_API_BASE", "https://api.stripe.com"),
                currency: vars.or("PAYMENT_CURRENCY", "usd"),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.security.rate_limit_requests == 0 {
            return Err(AppError::Configuration(
                "Rate limit must be greater than 0".to_string(),
            ));
        }

        if self.security.rate_limit_window_secs == 0 {
            return Err(AppError::Configuration(
                "Rate limit window must be greater than 0".to_string(),
            ));
        }

        if self.security.jwt_secret.reveal().len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::Configuration(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_JWT_SECRET_LEN
            )));
        }

        Ok(())
    }
}

/// Typed access over an environment-like lookup
pub(crate) struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    /// Empty values count as unset
    pub(crate) fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    pub(crate) fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| AppError::Configuration(format!("{} not set", key)))
    }

    pub(crate) fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
            None => Ok(default),
        }
    }
}
