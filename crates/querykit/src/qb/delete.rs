//! DELETE query builder.

use crate::error::{SqlError, SqlResult};
use crate::qb::condition::{ConditionBuilder, ConditionList};
use crate::qb::render::{Fragment, SqlWriter};
use crate::qb::traits::{MutationQb, SqlQb};

/// DELETE query builder.
///
/// Without any WHERE call the statement deletes every row of the table.
#[derive(Clone, Debug, Default)]
pub struct DeleteQb {
    /// Table name
    table: String,
    /// WHERE conditions
    where_list: ConditionList,
    /// RETURNING columns
    returning_cols: Vec<String>,
}

impl DeleteQb {
    /// Create a new DELETE query builder.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Set (or replace) the target table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set RETURNING columns (string form).
    pub fn returning(mut self, cols: &str) -> Self {
        self.returning_cols = vec![cols.to_string()];
        self
    }

    /// Set RETURNING columns (array form).
    pub fn returning_cols(mut self, cols: &[&str]) -> Self {
        self.returning_cols = cols.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl ConditionBuilder for DeleteQb {
    fn conditions_mut(&mut self) -> &mut ConditionList {
        &mut self.where_list
    }
}

impl SqlQb for DeleteQb {
    fn render(&self) -> SqlResult<Fragment> {
        if self.table.trim().is_empty() {
            return Err(SqlError::validation("DELETE requires a table name"));
        }

        let mut w = SqlWriter::new();
        w.push("DELETE FROM ").push(&self.table);
        self.where_list.write_clause("WHERE", &mut w)?;

        if !self.returning_cols.is_empty() {
            w.push(" RETURNING ").push(&self.returning_cols.join(", "));
        }
        Ok(w.finish())
    }
}

impl MutationQb for DeleteQb {}
