//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `ACTIVATION_WINDOW_SECS` (optional): how long an activated card key stays valid, defaults to 86400 (24 hours), capped at ten years
/// - `DATABASE_MAX_CONNECTIONS` (optional): connection pool size, defaults to 5
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Activation window in seconds, at most `MAX_ACTIVATION_WINDOW_SECS`.
    /// Expiry is always derived from `first_used_at + activation_window_secs` at read time.
    #[serde(default = "default_activation_window")]
    pub activation_window_secs: i64,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("ACTIVATION_WINDOW_SECS must be between 1 and {max}, got {0}", max = MAX_ACTIVATION_WINDOW_SECS)]
    InvalidWindow(i64),

    #[error("DATABASE_MAX_CONNECTIONS must be at least 1")]
    InvalidPoolSize,
}

/// Upper bound for `ACTIVATION_WINDOW_SECS` (ten years), keeping `first_used_at + window` far from overflow.
pub const MAX_ACTIVATION_WINDOW_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_activation_window() -> i64 {
    24 * 60 * 60
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    /// - The activation window or pool size is out of range
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: activation_window_secs -> ACTIVATION_WINDOW_SECS
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ACTIVATION_WINDOW_SECS).contains(&self.activation_window_secs) {
            return Err(ConfigError::InvalidWindow(self.activation_window_secs));
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }
        Ok(())
    }
}
