use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub allowed_origins: Vec<String>,
    /// Email domains treated as host-institution members at identity sync.
    pub host_email_domains: Vec<String>,
    pub payu_merchant_key: String,
    pub payu_merchant_salt: String,
    pub payu_base_url: String,
    /// Frontend base URL; the gateway redirects the browser back to
    /// `{payment_return_url}/payment/return` after checkout.
    pub payment_return_url: String,
    pub verify_poll_attempts: u32,
    pub verify_poll_delay_ms: u64,
    pub rate_limit_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "kriya-fest".to_string()),
            allowed_origins: csv_var("ALLOWED_ORIGINS"),
            host_email_domains: csv_var("HOST_EMAIL_DOMAINS"),
            payu_merchant_key: env::var("PAYU_MERCHANT_KEY")
                .context("PAYU_MERCHANT_KEY must be set")?,
            payu_merchant_salt: env::var("PAYU_MERCHANT_SALT")
                .context("PAYU_MERCHANT_SALT must be set")?,
            payu_base_url: env::var("PAYU_BASE_URL")
                .unwrap_or_else(|_| "https://test.payu.in".to_string()),
            payment_return_url: env::var("PAYMENT_RETURN_URL")
                .context("PAYMENT_RETURN_URL must be set")?,
            verify_poll_attempts: env::var("VERIFY_POLL_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("VERIFY_POLL_ATTEMPTS must be a valid number")?,
            verify_poll_delay_ms: env::var("VERIFY_POLL_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .context("VERIFY_POLL_DELAY_MS must be a valid number")?,
            rate_limit_enabled: env::var("RATE_LIMIT_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }
}

fn csv_var(name: &str) -> Vec<String> {
    env::var(name)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
