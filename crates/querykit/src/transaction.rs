//! Linear transactions: begin, run a block, commit on success, roll back on
//! failure.
//!
//! There is no nesting, no savepoints and no retry. An error escaping the
//! block triggers a rollback and is returned to the caller unchanged; if the
//! rollback itself fails, that failure is logged and the original error still
//! wins.
//!
//! # Example
//!
//! ```ignore
//! use querykit::prelude::*;
//! use querykit::{qb, transaction};
//!
//! # async fn demo(exec: &PgExecutor) -> SqlResult<()> {
//! transaction(exec, async || {
//!     qb::update("accounts")
//!         .set(Record::new().with("balance", 0))
//!         .where_eq("id", 1)
//!         .execute(exec)
//!         .await?;
//!     qb::insert("audit")
//!         .values(Record::new().with("account_id", 1).with("action", "reset"))
//!         .execute(exec)
//!         .await?;
//!     Ok(())
//! })
//! .await?;
//! # Ok(()) }
//! ```

use crate::error::SqlError;
use crate::executor::Executor;
use crate::log;
use std::fmt;

/// Run `body` inside a transaction on `exec`.
///
/// The body's error type only needs to absorb [`SqlError`], so application
/// errors pass through the rollback untouched.
pub async fn transaction<E, F, T, Er>(exec: &E, body: F) -> Result<T, Er>
where
    E: Executor,
    F: AsyncFnOnce() -> Result<T, Er>,
    Er: From<SqlError> + fmt::Display,
{
    exec.begin_transaction().await?;
    log::log_transaction("begin");
    let result = body().await;
    finish(exec, result).await
}

/// Commit or roll back depending on `result`. Used by [`transaction`] and
/// the [`transaction!`](crate::transaction!) macro.
#[doc(hidden)]
pub async fn finish<E, T, Er>(exec: &E, result: Result<T, Er>) -> Result<T, Er>
where
    E: Executor,
    Er: From<SqlError> + fmt::Display,
{
    match result {
        Ok(value) => {
            exec.commit().await?;
            log::log_transaction("commit");
            Ok(value)
        }
        Err(error) => {
            match exec.rollback().await {
                Ok(()) => log::log_transaction("rollback"),
                Err(rollback_error) => log::log_rollback_failure(&error, &rollback_error),
            }
            Err(error)
        }
    }
}

/// Runs the given block inside a transaction on an [`Executor`](crate::Executor).
///
/// - Begins via `begin_transaction()`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)` and returns the error unchanged.
///
/// The block must evaluate to `querykit::SqlResult<T>`.
///
/// ```ignore
/// querykit::transaction!(&exec, {
///     qb::delete("sessions").where_eq("user_id", 7).execute(&exec).await?;
///     Ok(())
/// })?;
/// ```
#[macro_export]
macro_rules! transaction {
    ($exec:expr, $body:block) => {{
        let __querykit_exec = $exec;
        match $crate::Executor::begin_transaction(__querykit_exec).await {
            Err(error) => Err(error),
            Ok(()) => {
                let __querykit_tx_body_result: $crate::SqlResult<_> = async { $body }.await;
                $crate::transaction::finish(__querykit_exec, __querykit_tx_body_result).await
            }
        }
    }};
}
