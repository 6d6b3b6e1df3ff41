//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                      | Default          |
//! |-------------------------------|------------------|
//! | `SHOPKEEP_BIND_ADDR`          | `0.0.0.0`        |
//! | `SHOPKEEP_PORT`               | `8080`           |
//! | `SHOPKEEP_DATABASE_PATH`      | `./shopkeep.db`  |
//! | `SHOPKEEP_DB_MAX_CONNECTIONS` | `5`              |
//! | `JWT_SECRET`                  | dev secret       |
//! | `JWT_ACCESS_LIFETIME_SECS`    | `3600`           |
//! | `JWT_REFRESH_LIFETIME_SECS`   | `604800`         |
//! | `SHOPKEEP_CORS_ORIGIN`        | any origin       |

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Secret used when `JWT_SECRET` is unset. Fine for local development only.
pub const DEV_JWT_SECRET: &str = "shopkeep-dev-secret-change-in-production";

/// Shortest accepted JWT secret, in bytes.
const MIN_SECRET_LEN: usize = 16;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// Allowed CORS origin. `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "./shopkeep.db".to_string(),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_access_lifetime_secs: 3600,     // 1 hour
            jwt_refresh_lifetime_secs: 604_800, // 7 days
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let config = ServerConfig {
            bind_addr: lookup("SHOPKEEP_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_or(&lookup, "SHOPKEEP_PORT", defaults.port)?,
            database_path: lookup("SHOPKEEP_DATABASE_PATH").unwrap_or(defaults.database_path),
            db_max_connections: parse_or(
                &lookup,
                "SHOPKEEP_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_access_lifetime_secs: parse_or(
                &lookup,
                "JWT_ACCESS_LIFETIME_SECS",
                defaults.jwt_access_lifetime_secs,
            )?,
            jwt_refresh_lifetime_secs: parse_or(
                &lookup,
                "JWT_REFRESH_LIFETIME_SECS",
                defaults.jwt_refresh_lifetime_secs,
            )?,
            cors_origin: lookup("SHOPKEEP_CORS_ORIGIN").filter(|o| !o.trim().is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue("JWT_SECRET".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "SHOPKEEP_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()));
        }
        if self.jwt_refresh_lifetime_secs <= self.jwt_access_lifetime_secs {
            return Err(ConfigError::InvalidValue("JWT_REFRESH_LIFETIME_SECS".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("SHOPKEEP_DATABASE_PATH".to_string()));
        }
        Ok(())
    }

    /// Returns the `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// True when running with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database_path, "./shopkeep.db");
        assert_eq!(config.jwt_access_lifetime_secs, 3600);
        assert!(config.uses_dev_secret());
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SHOPKEEP_PORT", "9000"),
            ("JWT_SECRET", "a-much-longer-production-secret"),
            ("SHOPKEEP_CORS_ORIGIN", "https://shop.example.com"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert!(!config.uses_dev_secret());
        assert_eq!(config.cors_origin.as_deref(), Some("https://shop.example.com"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("SHOPKEEP_PORT", "eighty")]),
            Err(ConfigError::InvalidValue(key)) if key == "SHOPKEEP_PORT"
        ));
        assert!(load(&[("JWT_SECRET", "short")]).is_err());
        assert!(load(&[("JWT_REFRESH_LIFETIME_SECS", "60")]).is_err());
    }
}
