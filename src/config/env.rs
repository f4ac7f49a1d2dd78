// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use dotenv::dotenv;
use std::env;
use std::str::FromStr;

/// Placeholder shipped in sample env files; never a usable key
pub const PLACEHOLDER_API_KEY: &str = "DEFAULT_API_KEY";

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Places API key (secret)
    pub places_api_key: String,

    /// Places API base URL (default https://places.googleapis.com/v1)
    pub places_base_url: String,

    /// Local cache database
    /// Format: sqlite://path/to/file.db or sqlite::memory:
    pub database_url: String,

    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8003)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Maximum connections in database pool
    pub db_max_connections: u32,

    /// Connection timeout in seconds
    pub db_connection_timeout: u64,

    /// Timeout for a single Places API request in seconds
    pub request_timeout_secs: u64,

    /// Bounding box for fetched photos, in pixels
    pub photo_max_width: u32,
    pub photo_max_height: u32,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            places_api_key: String::new(),
            places_base_url: "https://places.googleapis.com/v1".to_string(),
            database_url: "sqlite://places.db".to_string(),
            server_address: "127.0.0.1".to_string(),
            server_port: 8003,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            db_max_connections: 5,
            db_connection_timeout: 30,
            request_timeout_secs: 10,
            photo_max_width: 500,
            photo_max_height: 300,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment, falling back to
    /// Config::default() for anything unset or unparsable
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Config::default();

        Config {
            places_api_key: env::var("PLACES_API_KEY").unwrap_or_default(),
            places_base_url: env::var("PLACES_BASE_URL").unwrap_or(defaults.places_base_url),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            server_address: env::var("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", defaults.db_max_connections),
            db_connection_timeout: env_or("DB_CONNECTION_TIMEOUT", defaults.db_connection_timeout),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            photo_max_width: env_or("PHOTO_MAX_WIDTH", defaults.photo_max_width),
            photo_max_height: env_or("PHOTO_MAX_HEIGHT", defaults.photo_max_height),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: The service cannot do anything without a real API key,
    /// so a missing or placeholder key refuses startup
    pub fn validate(&self) -> Result<(), String> {
        if self.places_api_key.is_empty() || self.places_api_key == PLACEHOLDER_API_KEY {
            return Err("PLACES_API_KEY is required".to_string());
        }

        if self.database_url.is_empty() {
            return Err("DATABASE_URL is required".to_string());
        }

        if self.photo_max_width == 0 || self.photo_max_height == 0 {
            return Err("PHOTO_MAX_WIDTH and PHOTO_MAX_HEIGHT must be positive".to_string());
        }

        Ok(())
    }
}
