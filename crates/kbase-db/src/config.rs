//! Database configuration and connection.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | required |
//! | `DB_MAX_CONNECTIONS` | 5 |
//! | `DB_MIN_CONNECTIONS` | 1 |
//! | `DB_CONNECT_TIMEOUT_SECS` | 30 |
//! | `DB_IDLE_TIMEOUT_SECS` | 600 |
//!
//! The repository connection is process-wide: build one [`DbConfig`] at
//! startup and share the resulting [`crate::Database`].

use std::env;
use std::str::FromStr;
use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::{debug, info};

use kbase_core::Result;

/// Default maximum number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default minimum number of pooled connections.
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Default time to wait for a connection, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle time before a pooled connection is closed, in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for kbase_core::Error {
    fn from(e: ConfigError) -> Self {
        kbase_core::Error::Config(e.to_string())
    }
}

/// Connection settings for the PostgreSQL store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl DbConfig {
    /// Settings for `database_url` with default pool bounds.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let config = Self {
            database_url,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS)?,
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
            idle_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DB_IDLE_TIMEOUT_SECS",
                DEFAULT_IDLE_TIMEOUT_SECS,
            )?),
        };
        config.validate()?;

        debug!(
            subsystem = "db",
            component = "config",
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database configuration loaded"
        );
        Ok(config)
    }

    /// Check pool bounds.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Validation(format!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    /// Pool options for these settings.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
    }

    /// Validate and open the connection pool.
    pub async fn connect(&self) -> Result<PgPool> {
        self.validate()?;
        let start = Instant::now();

        let pool = self
            .pool_options()
            .connect(&self.database_url)
            .await
            .map_err(kbase_core::Error::Database)?;

        info!(
            subsystem = "db",
            component = "config",
            op = "connect",
            max_connections = self.max_connections,
            pool_size = pool.size(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Database connection pool established"
        );
        Ok(pool)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> std::result::Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
    }
}
