//! Statement logging.
//!
//! Every event goes to the `querykit.sql` target. With the `tracing` feature
//! disabled these functions compile to nothing.

use crate::config::ExecutorConfig;
#[cfg(feature = "tracing")]
use crate::config::SqlLogLevel;
#[cfg(feature = "tracing")]
use crate::executor::QueryType;

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn display_sql(sql: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

/// Log a statement about to run, if the config asks for it.
#[cfg(feature = "tracing")]
pub(crate) fn log_statement(config: &ExecutorConfig, sql: &str, binding_count: usize) {
    if !config.log_sql {
        return;
    }
    let kind = QueryType::from_sql(sql);
    let sql = display_sql(sql, config.max_logged_sql_len);
    match config.sql_log_level {
        SqlLogLevel::Error => {
            tracing::error!(target: "querykit.sql", %kind, binding_count, sql = %sql)
        }
        SqlLogLevel::Warn => {
            tracing::warn!(target: "querykit.sql", %kind, binding_count, sql = %sql)
        }
        SqlLogLevel::Info => {
            tracing::info!(target: "querykit.sql", %kind, binding_count, sql = %sql)
        }
        SqlLogLevel::Debug => {
            tracing::debug!(target: "querykit.sql", %kind, binding_count, sql = %sql)
        }
        SqlLogLevel::Trace => {
            tracing::trace!(target: "querykit.sql", %kind, binding_count, sql = %sql)
        }
    }
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_statement(_config: &ExecutorConfig, _sql: &str, _binding_count: usize) {}

/// Transaction lifecycle event (`begin`, `commit`, `rollback`).
#[cfg(feature = "tracing")]
pub(crate) fn log_transaction(event: &'static str) {
    tracing::debug!(target: "querykit.sql", event, "transaction");
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_transaction(_event: &'static str) {}

/// A rollback failed after the transaction body had already failed.
#[cfg(feature = "tracing")]
pub(crate) fn log_rollback_failure(body_error: &dyn std::fmt::Display, rollback_error: &dyn std::fmt::Display) {
    tracing::warn!(
        target: "querykit.sql",
        error = %body_error,
        rollback_error = %rollback_error,
        "rollback failed after transaction error"
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn log_rollback_failure(
    _body_error: &dyn std::fmt::Display,
    _rollback_error: &dyn std::fmt::Display,
) {
}
