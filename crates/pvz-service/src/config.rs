//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                     | Default                          |
//! |------------------------------|----------------------------------|
//! | `PVZ_DATABASE_PATH`          | `<platform data dir>/pvz.db`     |
//! | `PVZ_DB_MAX_CONNECTIONS`     | `5`                              |
//! | `PVZ_JWT_SECRET`             | development secret               |
//! | `PVZ_REFRESH_SECRET`         | development secret               |
//! | `PVZ_ACCESS_TOKEN_TTL_SECS`  | `900` (15 minutes)               |
//! | `PVZ_REFRESH_TOKEN_TTL_SECS` | `604800` (7 days)                |
//! | `PVZ_TX_TIMEOUT_MS`          | unset (no deadline)              |
//! | `PVZ_TX_MAX_ATTEMPTS`        | `5`                              |
//! | `PVZ_ARGON2_MEMORY_KIB`      | `19456`                          |
//! | `PVZ_ARGON2_ITERATIONS`      | `2`                              |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use pvz_db::{DbConfig, TransactorConfig};

const DEV_JWT_SECRET: &str = "pvz-dev-access-secret-change-in-production";
const DEV_REFRESH_SECRET: &str = "pvz-dev-refresh-secret-change-in-production";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// HMAC secret for access tokens
    pub jwt_secret: String,

    /// HMAC secret for refresh tokens
    pub refresh_secret: String,

    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,

    /// Per-transaction deadline
    pub tx_timeout_ms: Option<u64>,

    /// Attempts per transaction when the database is locked
    pub tx_max_attempts: u32,

    /// Argon2 memory cost
    pub argon2_memory_kib: u32,

    /// Argon2 time cost
    pub argon2_iterations: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup("PVZ_DATABASE_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let config = AppConfig {
            database_path,
            db_max_connections: parse_or(&lookup, "PVZ_DB_MAX_CONNECTIONS", 5)?,
            jwt_secret: lookup("PVZ_JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            refresh_secret: lookup("PVZ_REFRESH_SECRET")
                .unwrap_or_else(|| DEV_REFRESH_SECRET.to_string()),
            access_token_ttl_secs: parse_or(&lookup, "PVZ_ACCESS_TOKEN_TTL_SECS", 900)?, // 15 minutes
            refresh_token_ttl_secs: parse_or(&lookup, "PVZ_REFRESH_TOKEN_TTL_SECS", 604_800)?, // 7 days
            tx_timeout_ms: lookup("PVZ_TX_TIMEOUT_MS")
                .map(|raw| {
                    raw.parse()
                        .map_err(|_| ConfigError::InvalidValue("PVZ_TX_TIMEOUT_MS".to_string()))
                })
                .transpose()?,
            tx_max_attempts: parse_or(&lookup, "PVZ_TX_MAX_ATTEMPTS", 5)?,
            argon2_memory_kib: parse_or(&lookup, "PVZ_ARGON2_MEMORY_KIB", 19_456)?,
            argon2_iterations: parse_or(&lookup, "PVZ_ARGON2_ITERATIONS", 2)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Defaults for a given database file, without consulting the environment.
    pub fn for_database(path: impl Into<PathBuf>) -> Self {
        AppConfig {
            database_path: path.into(),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            refresh_secret: DEV_REFRESH_SECRET.to_string(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 604_800,
            tx_timeout_ms: None,
            tx_max_attempts: 5,
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("PVZ_JWT_SECRET".to_string()));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::MissingRequired("PVZ_REFRESH_SECRET".to_string()));
        }
        // A refresh token must never validate as an access token
        if self.jwt_secret == self.refresh_secret {
            return Err(ConfigError::InvalidValue("PVZ_REFRESH_SECRET".to_string()));
        }
        if self.access_token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("PVZ_ACCESS_TOKEN_TTL_SECS".to_string()));
        }
        if self.refresh_token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("PVZ_REFRESH_TOKEN_TTL_SECS".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("PVZ_DB_MAX_CONNECTIONS".to_string()));
        }
        if self.tx_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("PVZ_TX_MAX_ATTEMPTS".to_string()));
        }
        Ok(())
    }

    /// Pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }

    /// Retry/deadline settings derived from this configuration.
    pub fn transactor_config(&self) -> TransactorConfig {
        TransactorConfig::default()
            .max_attempts(self.tx_max_attempts)
            .timeout(self.tx_timeout_ms.map(Duration::from_millis))
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

/// Platform data directory, e.g. `~/.local/share/pvz-backend/pvz.db` on Linux.
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("ru", "pvz", "pvz-backend")
        .ok_or_else(|| ConfigError::MissingRequired("PVZ_DATABASE_PATH".to_string()))?;

    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {}", data_dir.display(), e)))?;

    Ok(data_dir.join("pvz.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Cannot prepare data directory: {0}")]
    DataDir(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("PVZ_DATABASE_PATH", "/tmp/pvz.db")])).unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/pvz.db"));
        assert_eq!(config.access_token_ttl_secs, 900);
        assert_eq!(config.refresh_token_ttl_secs, 604_800);
        assert_eq!(config.tx_max_attempts, 5);
        assert!(config.tx_timeout_ms.is_none());
        assert_ne!(config.jwt_secret, config.refresh_secret);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PVZ_DATABASE_PATH", "/tmp/pvz.db"),
            ("PVZ_DB_MAX_CONNECTIONS", "8"),
            ("PVZ_TX_TIMEOUT_MS", "250"),
            ("PVZ_TX_MAX_ATTEMPTS", "3"),
            ("PVZ_JWT_SECRET", "a"),
            ("PVZ_REFRESH_SECRET", "b"),
        ]))
        .unwrap();

        assert_eq!(config.db_max_connections, 8);
        assert_eq!(config.tx_timeout_ms, Some(250));
        assert_eq!(config.transactor_config().max_attempts, 3);
        assert_eq!(
            config.transactor_config().timeout,
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.db_config().max_connections, 8);
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("PVZ_DATABASE_PATH", "/tmp/pvz.db"),
            ("PVZ_ACCESS_TOKEN_TTL_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "PVZ_ACCESS_TOKEN_TTL_SECS"));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("PVZ_DATABASE_PATH", "/tmp/pvz.db"),
            ("PVZ_JWT_SECRET", "same"),
            ("PVZ_REFRESH_SECRET", "same"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key) if key == "PVZ_REFRESH_SECRET"));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("PVZ_DATABASE_PATH", "/tmp/pvz.db"),
            ("PVZ_TX_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
