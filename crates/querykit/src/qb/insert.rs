//! INSERT query builder.

use crate::error::{SqlError, SqlResult};
use crate::qb::render::{Fragment, SqlWriter};
use crate::qb::traits::{MutationQb, SqlQb};
use crate::record::Record;

/// INSERT query builder.
///
/// The first row fixes the column list and its order; every later row must
/// carry exactly the same columns. Bindings are flattened row-major.
#[derive(Clone, Debug, Default)]
pub struct InsertQb {
    /// Table name
    table: String,
    /// Rows to insert
    rows: Vec<Record>,
    /// RETURNING columns
    returning_cols: Vec<String>,
}

impl InsertQb {
    /// Create a new INSERT query builder.
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

    /// Append one row.
    pub fn values(mut self, row: impl Into<Record>) -> Self {
        self.rows.push(row.into());
        self
    }

    /// Append a batch of rows.
    pub fn values_many<R: Into<Record>>(mut self, rows: impl IntoIterator<Item = R>) -> Self {
        self.rows.extend(rows.into_iter().map(Into::into));
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

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn validate(&self) -> SqlResult<Vec<&str>> {
        if self.table.trim().is_empty() {
            return Err(SqlError::validation("INSERT requires a table name"));
        }
        let first = self
            .rows
            .first()
            .ok_or_else(|| SqlError::validation("INSERT requires at least one row"))?;
        if first.is_empty() {
            return Err(SqlError::validation("INSERT row has no columns"));
        }
        let columns: Vec<&str> = first.columns().collect();

        for (i, row) in self.rows.iter().enumerate().skip(1) {
            if let Some(missing) = columns.iter().find(|c| !row.contains(c)) {
                return Err(SqlError::validation(format!(
                    "INSERT row {i} is missing column '{missing}'"
                )));
            }
            if row.len() != columns.len() {
                let extra = row.columns().find(|c| !first.contains(c)).unwrap_or_default();
                return Err(SqlError::validation(format!(
                    "INSERT row {i} has column '{extra}' not present in the first row"
                )));
            }
        }
        Ok(columns)
    }
}

impl SqlQb for InsertQb {
    fn render(&self) -> SqlResult<Fragment> {
        let columns = self.validate()?;

        let mut w = SqlWriter::new();
        w.push("INSERT INTO ")
            .push(&self.table)
            .push(" (")
            .push(&columns.join(", "))
            .push(") VALUES ");

        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push("(");
            // validate() guarantees every column is present
            w.push_bind_list(columns.iter().filter_map(|c| row.get(c)));
            w.push(")");
        }

        if !self.returning_cols.is_empty() {
            w.push(" RETURNING ").push(&self.returning_cols.join(", "));
        }
        Ok(w.finish())
    }
}

impl MutationQb for InsertQb {}
