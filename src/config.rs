//! Database settings for the task store.
//!
//! [`DatabaseArgs`] exposes the settings as command-line flags, each backed
//! by an environment variable. `DATABASE_URL` wins when present. Otherwise
//! the URL is composed from `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`,
//! and `DB_NAME`. Pool sizing comes from `DB_POOL_MAX_SIZE`,
//! `DB_POOL_ACQUIRE_TIMEOUT_MS`, and `DB_POOL_IDLE_TIMEOUT_MS`.

use crate::task::adapters::postgres::TaskPgPool;
use clap::Args;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_USER: &str = "postgres";
const DEFAULT_DATABASE: &str = "kanban";
const DEFAULT_MAX_POOL_SIZE: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_IDLE_TIMEOUT_MS: u64 = 10_000;

/// Errors raised while building the pool.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The pool size must allow at least one connection.
    #[error("DB_POOL_MAX_SIZE must be at least 1")]
    EmptyPool,

    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[source] PoolError),
}

/// Connection flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    /// Full connection URL; overrides the component flags
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Database host
    #[arg(long, global = true, env = "DB_HOST", default_value = DEFAULT_HOST)]
    pub db_host: String,

    /// Database port
    #[arg(long, global = true, env = "DB_PORT", default_value_t = DEFAULT_PORT)]
    pub db_port: u16,

    /// Database user
    #[arg(long, global = true, env = "DB_USER", default_value = DEFAULT_USER)]
    pub db_user: String,

    /// Database password
    #[arg(long, global = true, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database name
    #[arg(long, global = true, env = "DB_NAME", default_value = DEFAULT_DATABASE)]
    pub db_name: String,

    /// Maximum number of pooled connections
    #[arg(
        long,
        global = true,
        env = "DB_POOL_MAX_SIZE",
        default_value_t = DEFAULT_MAX_POOL_SIZE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub db_pool_max_size: u32,

    /// Milliseconds to wait for a pooled connection
    #[arg(
        long,
        global = true,
        env = "DB_POOL_ACQUIRE_TIMEOUT_MS",
        default_value_t = DEFAULT_ACQUIRE_TIMEOUT_MS
    )]
    pub db_pool_acquire_timeout_ms: u64,

    /// Milliseconds an idle connection is kept
    #[arg(
        long,
        global = true,
        env = "DB_POOL_IDLE_TIMEOUT_MS",
        default_value_t = DEFAULT_IDLE_TIMEOUT_MS
    )]
    pub db_pool_idle_timeout_ms: u64,
}

impl DatabaseArgs {
    /// Resolves the flags into settings.
    ///
    /// A blank URL counts as absent and a blank password as none.
    #[must_use]
    pub fn into_settings(self) -> DatabaseSettings {
        let url = match self.database_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => url,
            None => {
                let credentials = match self.db_password.filter(|password| !password.is_empty()) {
                    Some(password) => format!("{}:{password}", self.db_user),
                    None => self.db_user,
                };
                format!(
                    "postgres://{credentials}@{}:{}/{}",
                    self.db_host, self.db_port, self.db_name
                )
            }
        };

        DatabaseSettings {
            url,
            max_pool_size: self.db_pool_max_size,
            acquire_timeout: Duration::from_millis(self.db_pool_acquire_timeout_ms),
            idle_timeout: Duration::from_millis(self.db_pool_idle_timeout_ms),
        }
    }
}

/// Connection and pool settings for the task store.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    url: String,
    max_pool_size: u32,
    acquire_timeout: Duration,
    idle_timeout: Duration,
}

impl DatabaseSettings {
    /// Creates settings for a URL with the default pool shape.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            acquire_timeout: Duration::from_millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
        }
    }

    /// Sets the maximum number of pooled connections.
    #[must_use]
    pub const fn with_max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Returns the connection URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the maximum number of pooled connections.
    #[must_use]
    pub const fn max_pool_size(&self) -> u32 {
        self.max_pool_size
    }

    /// Returns how long a caller waits for a pooled connection.
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    /// Returns how long an idle connection is kept.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Returns the URL with any password replaced by `***`.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let Some((credentials, host)) = rest.rsplit_once('@') else {
            return self.url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
            None => self.url.clone(),
        }
    }

    /// Builds an r2d2 pool for these settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPool`] for a zero pool size or
    /// [`ConfigError::Pool`] when the pool cannot be created.
    pub fn build_pool(&self) -> Result<TaskPgPool, ConfigError> {
        if self.max_pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        let manager = ConnectionManager::<PgConnection>::new(self.url.as_str());
        Pool::builder()
            .max_size(self.max_pool_size)
            .min_idle(Some(0))
            .connection_timeout(self.acquire_timeout)
            .idle_timeout(Some(self.idle_timeout))
            .build(manager)
            .map_err(ConfigError::Pool)
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &self.redacted_url())
            .field("max_pool_size", &self.max_pool_size)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
