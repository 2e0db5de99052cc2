//! Recording executor for unit tests.

use crate::error::{SqlError, SqlResult};
use crate::executor::Executor;
use crate::record::Record;
use crate::value::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Query(String, Vec<Value>),
    Execute(String, Vec<Value>),
    Begin,
    Commit,
    Rollback,
}

/// Records every call and answers with canned rows.
#[derive(Debug, Default)]
pub(crate) struct MockExecutor {
    pub(crate) calls: Mutex<Vec<Call>>,
    pub(crate) rows: Mutex<Vec<Record>>,
    pub(crate) affected: AtomicU64,
    pub(crate) in_transaction: AtomicBool,
    pub(crate) fail_statements: bool,
    pub(crate) fail_commit: bool,
    pub(crate) fail_rollback: bool,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Record>) -> Self {
        let exec = Self::default();
        *exec.rows.lock().unwrap() = rows;
        exec
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn backend_error() -> SqlError {
        SqlError::executor(std::io::Error::other("backend failure"))
    }
}

impl Executor for MockExecutor {
    async fn query(&self, sql: &str, bindings: &[Value]) -> SqlResult<Vec<Record>> {
        self.record(Call::Query(sql.to_string(), bindings.to_vec()));
        if self.fail_statements {
            return Err(Self::backend_error());
        }
        let rows = self.rows.lock().unwrap().clone();
        self.affected.store(rows.len() as u64, Ordering::SeqCst);
        Ok(rows)
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> SqlResult<u64> {
        self.record(Call::Execute(sql.to_string(), bindings.to_vec()));
        if self.fail_statements {
            return Err(Self::backend_error());
        }
        self.affected.store(1, Ordering::SeqCst);
        Ok(1)
    }

    fn last_insert_id(&self) -> Option<i64> {
        None
    }

    fn affected_rows(&self) -> u64 {
        self.affected.load(Ordering::SeqCst)
    }

    async fn begin_transaction(&self) -> SqlResult<()> {
        if self.in_transaction.swap(true, Ordering::SeqCst) {
            return Err(SqlError::validation("nested transactions are not supported"));
        }
        self.record(Call::Begin);
        Ok(())
    }

    async fn commit(&self) -> SqlResult<()> {
        self.record(Call::Commit);
        self.in_transaction.store(false, Ordering::SeqCst);
        if self.fail_commit {
            return Err(Self::backend_error());
        }
        Ok(())
    }

    async fn rollback(&self) -> SqlResult<()> {
        self.record(Call::Rollback);
        self.in_transaction.store(false, Ordering::SeqCst);
        if self.fail_rollback {
            return Err(Self::backend_error());
        }
        Ok(())
    }
}
