//! Postgres [`Executor`] backed by `tokio-postgres`.

use crate::config::ExecutorConfig;
use crate::error::{SqlError, SqlResult};
use crate::executor::{Executor, QueryType};
use crate::log;
use crate::qb::placeholder_offsets;
use crate::record::Record;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};
use uuid::Uuid;

/// Rewrite `?` placeholders to Postgres `$n`, leaving literals, quoted
/// identifiers and comments alone.
pub fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut last = 0;
    for (n, offset) in placeholder_offsets(sql).into_iter().enumerate() {
        out.push_str(&sql[last..offset]);
        out.push('$');
        out.push_str(&(n + 1).to_string());
        last = offset + 1;
    }
    out.push_str(&sql[last..]);
    out
}

fn get<'a, T>(row: &'a Row, idx: usize, name: &str) -> SqlResult<Option<T>>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| SqlError::decode(name, e.to_string()))
}

fn decode_column(row: &Row, idx: usize) -> SqlResult<Value> {
    let column = &row.columns()[idx];
    let name = column.name();
    let ty = column.type_();
    let value: Value = if *ty == Type::BOOL {
        get::<bool>(row, idx, name)?.into()
    } else if *ty == Type::INT2 {
        get::<i16>(row, idx, name)?.into()
    } else if *ty == Type::INT4 {
        get::<i32>(row, idx, name)?.into()
    } else if *ty == Type::INT8 {
        get::<i64>(row, idx, name)?.into()
    } else if *ty == Type::FLOAT4 {
        get::<f32>(row, idx, name)?.into()
    } else if *ty == Type::FLOAT8 {
        get::<f64>(row, idx, name)?.into()
    } else if *ty == Type::NUMERIC {
        get::<Decimal>(row, idx, name)?.into()
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty) {
        get::<String>(row, idx, name)?.into()
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get::<serde_json::Value>(row, idx, name)?.into()
    } else if *ty == Type::UUID {
        get::<Uuid>(row, idx, name)?.into()
    } else if *ty == Type::TIMESTAMPTZ {
        get::<DateTime<Utc>>(row, idx, name)?.into()
    } else if *ty == Type::TIMESTAMP {
        get::<NaiveDateTime>(row, idx, name)?.into()
    } else if *ty == Type::DATE {
        get::<NaiveDate>(row, idx, name)?.into()
    } else {
        return Err(SqlError::decode(name, format!("unsupported column type {ty}")));
    };
    Ok(value)
}

/// Convert a row to a [`Record`], keyed by output column name.
pub fn decode_row(row: &Row) -> SqlResult<Record> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        record.insert(column.name(), decode_column(row, idx)?);
    }
    Ok(record)
}

/// `tokio-postgres` executor.
///
/// Holds one connection. Statement state (`affected_rows`, `last_insert_id`)
/// reflects the most recent statement run through this executor.
pub struct PgExecutor {
    client: Client,
    config: ExecutorConfig,
    affected_rows: AtomicU64,
    last_insert_id: AtomicI64,
    has_insert_id: AtomicBool,
    in_transaction: AtomicBool,
}

impl std::fmt::Debug for PgExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgExecutor")
            .field("config", &self.config)
            .field("in_transaction", &self.in_transaction())
            .finish_non_exhaustive()
    }
}

impl PgExecutor {
    /// Connect using `config.database_url` and drive the connection on the
    /// current tokio runtime.
    pub async fn connect(config: &ExecutorConfig) -> SqlResult<Self> {
        let (client, connection) = tokio_postgres::connect(&config.database_url, NoTls)
            .await
            .map_err(|e| SqlError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                #[cfg(feature = "tracing")]
                tracing::error!(target: "querykit.sql", error = %e, "connection closed with error");
                #[cfg(not(feature = "tracing"))]
                let _ = e;
            }
        });
        Ok(Self::from_client(client, config.clone()))
    }

    /// Wrap an already connected client.
    pub fn from_client(client: Client, config: ExecutorConfig) -> Self {
        Self {
            client,
            config,
            affected_rows: AtomicU64::new(0),
            last_insert_id: AtomicI64::new(0),
            has_insert_id: AtomicBool::new(false),
            in_transaction: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::SeqCst)
    }

    async fn with_timeout<T, F>(&self, future: F) -> SqlResult<T>
    where
        F: std::future::Future<Output = Result<T, tokio_postgres::Error>> + Send,
    {
        match self.config.query_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, future).await {
                Ok(result) => result.map_err(SqlError::from),
                Err(_) => {
                    let cancel_token = self.client.cancel_token();
                    tokio::spawn(async move {
                        let _ = cancel_token.cancel_query(NoTls).await;
                    });
                    Err(SqlError::Timeout(timeout))
                }
            },
            None => future.await.map_err(SqlError::from),
        }
    }

    fn set_insert_id(&self, id: Option<i64>) {
        if let Some(id) = id {
            self.last_insert_id.store(id, Ordering::SeqCst);
        }
        self.has_insert_id.store(id.is_some(), Ordering::SeqCst);
    }

    async fn control(&self, statement: &'static str) -> SqlResult<()> {
        log::log_statement(&self.config, statement, 0);
        self.with_timeout(self.client.batch_execute(statement)).await
    }
}

impl Executor for PgExecutor {
    async fn query(&self, sql: &str, bindings: &[Value]) -> SqlResult<Vec<Record>> {
        log::log_statement(&self.config, sql, bindings.len());
        let pg_sql = rewrite_placeholders(sql);
        let params: Vec<&(dyn ToSql + Sync)> =
            bindings.iter().map(|v| v as &(dyn ToSql + Sync)).collect();

        let rows = self.with_timeout(self.client.query(pg_sql.as_str(), &params)).await?;
        let records = rows.iter().map(decode_row).collect::<SqlResult<Vec<_>>>()?;

        self.affected_rows.store(records.len() as u64, Ordering::SeqCst);
        if QueryType::from_sql(sql) == QueryType::Insert {
            let id = records.last().and_then(|r| match r.get("id") {
                Some(Value::Int(id)) => Some(*id),
                _ => None,
            });
            self.set_insert_id(id);
        }
        Ok(records)
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> SqlResult<u64> {
        log::log_statement(&self.config, sql, bindings.len());
        let pg_sql = rewrite_placeholders(sql);
        let params: Vec<&(dyn ToSql + Sync)> =
            bindings.iter().map(|v| v as &(dyn ToSql + Sync)).collect();

        let n = self.with_timeout(self.client.execute(pg_sql.as_str(), &params)).await?;
        self.affected_rows.store(n, Ordering::SeqCst);
        if QueryType::from_sql(sql) == QueryType::Insert {
            self.set_insert_id(None);
        }
        Ok(n)
    }

    fn last_insert_id(&self) -> Option<i64> {
        self.has_insert_id
            .load(Ordering::SeqCst)
            .then(|| self.last_insert_id.load(Ordering::SeqCst))
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows.load(Ordering::SeqCst)
    }

    async fn begin_transaction(&self) -> SqlResult<()> {
        if self.in_transaction.swap(true, Ordering::SeqCst) {
            return Err(SqlError::validation("nested transactions are not supported"));
        }
        if let Err(e) = self.control("BEGIN").await {
            self.in_transaction.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    async fn commit(&self) -> SqlResult<()> {
        if !self.in_transaction() {
            return Err(SqlError::validation("commit without an open transaction"));
        }
        let result = self.control("COMMIT").await;
        self.in_transaction.store(false, Ordering::SeqCst);
        result
    }

    async fn rollback(&self) -> SqlResult<()> {
        if !self.in_transaction() {
            return Err(SqlError::validation("rollback without an open transaction"));
        }
        let result = self.control("ROLLBACK").await;
        self.in_transaction.store(false, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_in_order() {
        assert_eq!(
            rewrite_placeholders("SELECT * FROM users WHERE a = ? AND b IN (?, ?)"),
            "SELECT * FROM users WHERE a = $1 AND b IN ($2, $3)"
        );
    }

    #[test]
    fn leaves_literals_alone() {
        assert_eq!(
            rewrite_placeholders("SELECT '?' AS q, x FROM t WHERE y = ?"),
            "SELECT '?' AS q, x FROM t WHERE y = $1"
        );
    }

    #[test]
    fn leaves_identifiers_and_comments_alone() {
        assert_eq!(
            rewrite_placeholders("SELECT \"q?\" FROM t -- id = ?\nWHERE id = ? /* ? */ AND n = ?"),
            "SELECT \"q?\" FROM t -- id = ?\nWHERE id = $1 /* ? */ AND n = $2"
        );
    }

    #[test]
    fn more_than_nine_placeholders() {
        let sql = vec!["?"; 11].join(", ");
        assert!(rewrite_placeholders(&sql).ends_with("$10, $11"));
    }
}
