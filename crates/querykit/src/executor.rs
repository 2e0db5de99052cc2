//! The executor contract consumed by the builders.
//!
//! Builders only produce `(sql, bindings)`; everything that touches a
//! connection goes through [`Executor`]. Errors an executor returns are passed
//! back to the caller unchanged.

use crate::error::{SqlError, SqlResult};
use crate::record::Record;
use crate::value::Value;
use std::fmt;

/// Performs I/O for rendered statements.
///
/// SQL handed to an executor uses `?` placeholders; `bindings[i]` belongs to
/// the i-th `?`. Implementations translate to their backend's own style.
pub trait Executor: Send + Sync {
    /// Run a statement and return its rows.
    fn query(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<Vec<Record>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<u64>> + Send;

    /// Id generated by the most recent INSERT, if the backend reported one.
    fn last_insert_id(&self) -> Option<i64>;

    /// Rows affected (or returned) by the most recent statement.
    fn affected_rows(&self) -> u64;

    /// Start a transaction. Nested transactions are not supported.
    fn begin_transaction(&self) -> impl std::future::Future<Output = SqlResult<()>> + Send;

    /// Commit the open transaction.
    fn commit(&self) -> impl std::future::Future<Output = SqlResult<()>> + Send;

    /// Roll back the open transaction.
    fn rollback(&self) -> impl std::future::Future<Output = SqlResult<()>> + Send;

    /// Run a statement and return the **first** row.
    ///
    /// - 0 rows: returns [`SqlError::NotFound`]
    /// - 1 or more rows: returns the first row
    fn query_one(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<Record>> + Send {
        async move {
            self.query(sql, bindings)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| SqlError::not_found("Expected 1 row, got 0"))
        }
    }
}

/// Statement kind, detected from the leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// Anything else (transaction control, DDL, hand-written SQL)
    Other,
}

impl QueryType {
    /// Detect the statement kind of `sql`.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start().trim_start_matches('(');
        let keyword = trimmed
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("");
        if keyword.eq_ignore_ascii_case("SELECT") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("INSERT") {
            QueryType::Insert
        } else if keyword.eq_ignore_ascii_case("UPDATE") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("DELETE") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryType::Select => "SELECT",
            QueryType::Insert => "INSERT",
            QueryType::Update => "UPDATE",
            QueryType::Delete => "DELETE",
            QueryType::Other => "OTHER",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_leading_keyword() {
        assert_eq!(QueryType::from_sql("SELECT * FROM users"), QueryType::Select);
        assert_eq!(QueryType::from_sql("  insert into t (a) VALUES (?)"), QueryType::Insert);
        assert_eq!(QueryType::from_sql("UPDATE t SET a = ?"), QueryType::Update);
        assert_eq!(QueryType::from_sql("DELETE FROM t"), QueryType::Delete);
        assert_eq!(QueryType::from_sql("(SELECT 1) UNION (SELECT 2)"), QueryType::Select);
        assert_eq!(QueryType::from_sql("BEGIN"), QueryType::Other);
    }
}
