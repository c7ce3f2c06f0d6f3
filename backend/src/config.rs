//! Configuration management for the Kedai POS server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with KPOS_ prefix

use config::{ConfigError, Environment, File};
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

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// First admin account, created when the users table is empty
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// Firebase Realtime Database used for stock counters
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,

    /// Midtrans payment gateway
    #[serde(default)]
    pub midtrans: Option<MidtransConfig>,
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
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapConfig {
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FirebaseConfig {
    /// e.g. https://kedai-pos-default-rtdb.asia-southeast1.firebasedatabase.app
    pub database_url: String,

    /// Database secret or ID token, sent as the `auth` query parameter
    pub auth_token: Option<String>,

    /// Path prefix under which counters are stored
    #[serde(default)]
    pub root: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MidtransConfig {
    pub server_key: String,

    #[serde(default)]
    pub is_production: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("KPOS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 86400)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (KPOS_ prefix)
            .add_source(
                Environment::with_prefix("KPOS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl BootstrapConfig {
    /// Credentials for the first admin, if both are configured
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_username.as_deref(), self.admin_password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_requires_both_credentials() {
        let none = BootstrapConfig::default();
        assert!(none.admin_credentials().is_none());

        let partial = BootstrapConfig {
            admin_username: Some("admin".to_string()),
            admin_password: Some(String::new()),
        };
        assert!(partial.admin_credentials().is_none());

        let full = BootstrapConfig {
            admin_username: Some("admin".to_string()),
            admin_password: Some("rahasia123".to_string()),
        };
        assert_eq!(full.admin_credentials(), Some(("admin", "rahasia123")));
    }
}
