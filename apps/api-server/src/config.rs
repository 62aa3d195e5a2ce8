//! Application configuration loaded from environment variables.

use std::env;

use kindred_infra::{JwtConfig, LocalStorageConfig};

#[cfg(feature = "postgres")]
use kindred_infra::DatabaseConfig;
#[cfg(feature = "object-storage")]
use kindred_infra::HttpStorageConfig;
#[cfg(feature = "rate-limit")]
use kindred_infra::RateLimitConfig;
#[cfg(feature = "smtp")]
use kindred_infra::SmtpConfig;

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub secure: bool,
    pub max_age_secs: i64,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    /// Where avatars (and post media without remote storage) are written.
    pub uploads: LocalStorageConfig,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "smtp")]
    pub smtp: Option<SmtpConfig>,
    #[cfg(feature = "object-storage")]
    pub storage: Option<HttpStorageConfig>,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let jwt = JwtConfig::from_env();
        let is_production = env::var("RUST_ENV")
            .map(|v| v == "production" || v == "prod")
            .unwrap_or(false);

        let mut uploads = LocalStorageConfig::from_env();
        if let Ok(public_url) = env::var("PUBLIC_URL") {
            uploads.public_prefix = format!("{}/uploads", public_url.trim_end_matches('/'));
        }

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cookie: CookieConfig {
                secure: env::var("COOKIE_SECURE")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(is_production),
                max_age_secs: jwt.expiration_hours * 3600,
            },
            jwt,
            uploads,
            #[cfg(feature = "postgres")]
            database: DatabaseConfig::from_env(),
            #[cfg(feature = "smtp")]
            smtp: SmtpConfig::from_env(),
            #[cfg(feature = "object-storage")]
            storage: HttpStorageConfig::from_env(),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}
