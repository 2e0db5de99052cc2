//! Convenient imports for typical `querykit` usage.
//!
//! ```ignore
//! use querykit::prelude::*;
//! ```

pub use crate::{
    CaseExpr, ConditionBuilder, Executor, ExecutorConfig, FromRecord, FromValue, MutationQb, Op,
    PgExecutor, Record, SqlError, SqlQb, SqlResult, Value, transaction,
};
