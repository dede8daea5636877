//! Configuration management for the PrismaTech backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PRISMA_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session authentication configuration
    pub auth: AuthConfig,

    /// Sales defaults
    pub sales: SalesConfig,

    /// Rate limiting applied to the auth endpoints
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// MySQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Session lifetime in hours
    pub session_expiry_hours: i64,

    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SalesConfig {
    /// Tax rate applied when a sale does not specify one (0.16 = 16%)
    pub default_tax_rate: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per window per client key
    pub max_requests: u32,

    /// Window length in seconds
    pub window_seconds: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PRISMA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("auth.session_expiry_hours", 8)?
            .set_default("auth.bcrypt_cost", 12)?
            .set_default("sales.default_tax_rate", "0.16")?
            .set_default("rate_limit.max_requests", 10)?
            .set_default("rate_limit.window_seconds", 60)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PRISMA_ prefix)
            .add_source(
                Environment::with_prefix("PRISMA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
