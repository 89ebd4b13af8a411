//! Configuration loader for the `airlens` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::{env, net::SocketAddr, str::FromStr};

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional environment variable through `FromStr`, with a default.
macro_rules! parse_env_or {
    ($var_name:expr, $ty:ty, $default:expr) => {
        match env::var($var_name) {
            Ok(v) => v
                .parse::<$ty>()
                .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?,
            Err(_) => $default,
        }
    };
}

/// Which [`crate::store::Store`] implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}' (expected postgres|memory)")),
        }
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Store implementation to open at startup.
    pub store_backend: StoreBackend,

    /// PostgreSQL connection string; required for the postgres backend.
    pub db_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Request body limit for dataset uploads, in MiB.
    pub max_upload_mb: u32,

    /// Maximum number of records any list operation returns.
    pub list_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            db_url: None,
            db_pool_max: 5,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_upload_mb: 512,
            list_limit: 1000,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string (postgres backend only)
///
/// Optional:
/// - `STORE_BACKEND` – `postgres` or `memory` (default: postgres)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – listen address (default: 0.0.0.0:8080)
/// - `MAX_UPLOAD_MB` – upload body limit (default: 512)
/// - `LIST_LIMIT` – max records per list response (default: 1000)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();

    let store_backend = parse_env_or!("STORE_BACKEND", StoreBackend, StoreBackend::Postgres);
    let db_url = env::var("DATABASE_URL").ok();
    if store_backend == StoreBackend::Postgres && db_url.is_none() {
        return Err(anyhow!("DATABASE_URL must be set in .env or environment"));
    }

    Ok(Config {
        store_backend,
        db_url,
        db_pool_max: parse_env_u32!("DB_POOL_MAX", defaults.db_pool_max),
        bind_addr: parse_env_or!("BIND_ADDR", SocketAddr, defaults.bind_addr),
        max_upload_mb: parse_env_u32!("MAX_UPLOAD_MB", defaults.max_upload_mb),
        list_limit: parse_env_u32!("LIST_LIMIT", defaults.list_limit),
    })
}

impl Config {
    /// Upload body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    /// Database URL with the password replaced by `****`.
    pub fn masked_db_url(&self) -> String {
        // ---
        let Some(db_url) = self.db_url.as_deref() else {
            return "<unset>".to_string();
        };

        // Credentials sit between "://" and the last '@'
        let auth_start = db_url.find("://").map_or(0, |i| i + 3);
        if let Some(at_pos) = db_url.rfind('@').filter(|&at| at >= auth_start) {
            if let Some(rel) = db_url[auth_start..at_pos].rfind(':') {
                let colon_pos = auth_start + rel;
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
        db_url.to_string()
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  STORE_BACKEND : {:?}", self.store_backend);
        tracing::info!("  DATABASE_URL  : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX   : {}", self.db_pool_max);
        tracing::info!("  BIND_ADDR     : {}", self.bind_addr);
        tracing::info!("  MAX_UPLOAD_MB : {}", self.max_upload_mb);
        tracing::info!("  LIST_LIMIT    : {}", self.list_limit);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn with_url(url: &str) -> Config {
        Config {
            db_url: Some(url.to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_password_is_masked() {
        let cfg = with_url("postgres://airlens:s3cret@db:5432/airlens");
        assert_eq!(cfg.masked_db_url(), "postgres://airlens:****@db:5432/airlens");
    }

    #[test]
    fn test_password_is_masked_for_postgres_user() {
        // ---
        let cfg = with_url("postgres://postgres:hunter2@db:5432/airlens");
        let masked = cfg.masked_db_url();
        assert!(!masked.contains("hunter2"));
        assert_eq!(masked, "postgres://postgres:****@db:5432/airlens");

        let cfg = with_url("postgresql://postgresql:pw@db/airlens");
        assert_eq!(cfg.masked_db_url(), "postgresql://postgresql:****@db/airlens");
    }

    #[test]
    fn test_url_without_password_is_unchanged() {
        // ---
        let cfg = with_url("postgres://airlens@db/airlens");
        assert_eq!(cfg.masked_db_url(), "postgres://airlens@db/airlens");

        assert_eq!(Config::default().masked_db_url(), "<unset>");
    }

    #[test]
    fn test_store_backend_parsing() {
        // ---
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("PostgreSQL".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_upload_limit_in_bytes() {
        let cfg = Config {
            max_upload_mb: 2,
            ..Config::default()
        };
        assert_eq!(cfg.max_upload_bytes(), 2 * 1024 * 1024);
    }
}
