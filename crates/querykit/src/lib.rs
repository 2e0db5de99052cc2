//! # querykit
//!
//! A SQL-generation engine with a pluggable executor.
//!
//! ## Features
//!
//! - **One placeholder style**: every builder renders `?` placeholders plus a
//!   binding list in exactly the order the placeholders appear
//! - **Composable**: subqueries, `EXISTS`, `UNION` and raw fragments splice
//!   their bindings at the right position
//! - **Extensible projections**: anything implementing [`Renderable`] (for
//!   example [`CaseExpr`]) can sit in a SELECT list
//! - **Executor seam**: builders never touch a connection; an [`Executor`]
//!   runs the rendered statement. [`PgExecutor`] ships for Postgres
//! - **Linear transactions**: [`transaction()`] and [`transaction!`] commit
//!   on success and roll back on any error
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use querykit::prelude::*;
//! use querykit::qb;
//!
//! let exec = PgExecutor::connect(&ExecutorConfig::from_env()?).await?;
//!
//! // SELECT
//! let adults = qb::select("users")
//!     .where_op("age", ">=", 18)?
//!     .order_by_desc("created_at")
//!     .limit(10)
//!     .fetch_all(&exec)
//!     .await?;
//!
//! // INSERT
//! qb::insert("users")
//!     .values(Record::new().with("name", "alice").with("email", "alice@example.com"))
//!     .execute(&exec)
//!     .await?;
//! let id = exec.last_insert_id();
//!
//! // UPDATE
//! qb::update("users")
//!     .set(Record::new().with("status", "inactive"))
//!     .where_eq("id", 7)
//!     .execute(&exec)
//!     .await?;
//!
//! // DELETE
//! qb::delete("users").where_eq("id", 7).execute(&exec).await?;
//! ```

pub mod config;
pub mod error;
pub mod executor;
mod log;
pub mod pg;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod transaction;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ExecutorConfig, SqlLogLevel};
pub use error::{SqlError, SqlResult};
pub use executor::{Executor, QueryType};
pub use pg::PgExecutor;
pub use record::{FromRecord, FromValue, Record};
pub use transaction::transaction;
pub use value::Value;

// Re-export qb module for easy access
pub use qb::{
    delete, insert, select, update, Aggregate, CaseExpr, ConditionBuilder, DeleteQb, ExprRegistry,
    Fragment, InsertQb, MutationQb, Op, Renderable, SelectQb, SqlQb, UpdateQb, Where,
};
