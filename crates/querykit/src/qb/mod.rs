//! Query builders and the renderer behind them.
//!
//! Builders accumulate a clause model through chained calls; [`SqlQb::render`]
//! walks the model into SQL text with `?` placeholders and a binding list in
//! the same left-to-right order.
//!
//! # Usage
//!
//! ```
//! use querykit::prelude::*;
//! use querykit::qb;
//!
//! let frag = qb::select("users")
//!     .where_op("age", ">", 18)?
//!     .where_eq("country", "USA")
//!     .render()?;
//! assert_eq!(frag.sql, "SELECT * FROM users WHERE age > ? AND country = ?");
//! assert_eq!(frag.bindings, vec![Value::from(18), Value::from("USA")]);
//!
//! let frag = qb::insert("users")
//!     .values(Record::new().with("name", "alice").with("email", "alice@example.com"))
//!     .render()?;
//! assert_eq!(frag.sql, "INSERT INTO users (name, email) VALUES (?, ?)");
//!
//! let frag = qb::update("users")
//!     .set(Record::new().with("status", "inactive"))
//!     .where_eq("id", 7)
//!     .render()?;
//! assert_eq!(frag.sql, "UPDATE users SET status = ? WHERE id = ?");
//!
//! let frag = qb::delete("users").where_eq("id", 7).render()?;
//! assert_eq!(frag.sql, "DELETE FROM users WHERE id = ?");
//! # Ok::<(), querykit::SqlError>(())
//! ```

mod case;
mod clause;
mod condition;
mod delete;
mod expr;
mod insert;
mod render;
mod select;
mod traits;
mod update;

pub use case::CaseExpr;
pub use clause::{Conjunction, Direction, Join, JoinKind, JoinOn, Op, OrderBy};
pub use condition::{Condition, ConditionBuilder, ConditionKind, ConditionList, SubQuery, Where};
pub use delete::DeleteQb;
pub use expr::{Aggregate, AggregateFunc, Column, ExprRegistry, Projection, Renderable};
pub use insert::InsertQb;
pub use render::{count_placeholders, placeholder_offsets, Fragment, SqlWriter, PLACEHOLDER};
pub use select::SelectQb;
pub use traits::{MutationQb, SqlQb};
pub use update::UpdateQb;

/// Create a SELECT query builder for the given table.
pub fn select(table: impl Into<String>) -> SelectQb {
    SelectQb::new(table)
}

/// Create an INSERT query builder for the given table.
pub fn insert(table: impl Into<String>) -> InsertQb {
    InsertQb::new(table)
}

/// Create an UPDATE query builder for the given table.
///
/// Without a WHERE call the statement updates every row.
pub fn update(table: impl Into<String>) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE query builder for the given table.
///
/// Without a WHERE call the statement deletes every row.
pub fn delete(table: impl Into<String>) -> DeleteQb {
    DeleteQb::new(table)
}

#[cfg(test)]
mod tests;
