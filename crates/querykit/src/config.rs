//! Executor configuration.

use crate::error::{SqlError, SqlResult};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the connection string.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variable toggling SQL logging (`1`/`true`/`on`).
pub const ENV_LOG_SQL: &str = "QUERYKIT_LOG_SQL";
/// Environment variable holding the query timeout in milliseconds.
pub const ENV_QUERY_TIMEOUT_MS: &str = "QUERYKIT_QUERY_TIMEOUT_MS";

/// Level at which rendered statements are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlLogLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl FromStr for SqlLogLevel {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(SqlLogLevel::Error),
            "warn" | "warning" => Ok(SqlLogLevel::Warn),
            "info" => Ok(SqlLogLevel::Info),
            "debug" => Ok(SqlLogLevel::Debug),
            "trace" => Ok(SqlLogLevel::Trace),
            other => Err(SqlError::validation(format!("unknown log level '{other}'"))),
        }
    }
}

/// Settings for [`PgExecutor`](crate::PgExecutor).
///
/// Construct once and pass by reference to
/// [`PgExecutor::connect`](crate::PgExecutor::connect).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Per-statement timeout. `None` waits indefinitely.
    pub query_timeout: Option<Duration>,
    /// Whether to log each statement before it runs.
    pub log_sql: bool,
    /// Level for statement logging.
    pub sql_log_level: SqlLogLevel,
    /// Truncate logged SQL to this many bytes. `None` logs it whole.
    pub max_logged_sql_len: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            query_timeout: None,
            log_sql: false,
            sql_log_level: SqlLogLevel::Debug,
            max_logged_sql_len: Some(200),
        }
    }
}

impl ExecutorConfig {
    /// Create a new configuration for `database_url` with defaults.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Set the query timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Enable statement logging at `level`.
    pub fn log_sql(mut self, level: SqlLogLevel) -> Self {
        self.log_sql = true;
        self.sql_log_level = level;
        self
    }

    /// Set the maximum logged SQL length in bytes.
    pub fn max_logged_sql_len(mut self, len: usize) -> Self {
        self.max_logged_sql_len = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql_len = None;
        self
    }

    /// Read `DATABASE_URL`, `QUERYKIT_LOG_SQL` and `QUERYKIT_QUERY_TIMEOUT_MS`.
    pub fn from_env() -> SqlResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SqlResult<Self> {
        let database_url = lookup(ENV_DATABASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| SqlError::Connection(format!("{ENV_DATABASE_URL} is not set")))?;
        let mut config = Self::new(database_url);

        if let Some(flag) = lookup(ENV_LOG_SQL) {
            let flag = flag.trim().to_ascii_lowercase();
            config.log_sql = matches!(flag.as_str(), "1" | "true" | "yes" | "on");
            // Any other non-boolean value names the level.
            if let Ok(level) = flag.parse::<SqlLogLevel>() {
                config.log_sql = true;
                config.sql_log_level = level;
            }
        }

        if let Some(ms) = lookup(ENV_QUERY_TIMEOUT_MS) {
            let ms: u64 = ms.trim().parse().map_err(|_| {
                SqlError::validation(format!("{ENV_QUERY_TIMEOUT_MS} must be an integer, got '{ms}'"))
            })?;
            config.query_timeout = Some(Duration::from_millis(ms));
        }

        Ok(config)
    }
}
