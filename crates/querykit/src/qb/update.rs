//! UPDATE query builder.

use crate::error::{SqlError, SqlResult};
use crate::qb::condition::{ConditionBuilder, ConditionList};
use crate::qb::render::{Fragment, SqlWriter};
use crate::qb::traits::{MutationQb, SqlQb};
use crate::record::Record;
use crate::value::Value;

/// UPDATE query builder.
///
/// SET bindings come before WHERE bindings. Without any WHERE call the
/// statement updates every row of the table.
#[derive(Clone, Debug, Default)]
pub struct UpdateQb {
    /// Table name
    table: String,
    /// Assignments, in first-set order
    assignments: Record,
    /// WHERE conditions
    where_list: ConditionList,
    /// RETURNING columns
    returning_cols: Vec<String>,
}

impl UpdateQb {
    /// Create a new UPDATE query builder.
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

    /// Merge assignments. A column set twice keeps its first position and
    /// takes the latest value.
    pub fn set(mut self, assignments: impl Into<Record>) -> Self {
        self.assignments.merge(assignments.into());
        self
    }

    /// Assign a single column.
    pub fn set_value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.insert(column, value);
        self
    }

    /// Assign a JSON-serialized value.
    pub fn set_json<T: serde::Serialize>(self, column: &str, value: &T) -> SqlResult<Self> {
        let json = serde_json::to_value(value).map_err(|e| {
            SqlError::validation(format!("cannot serialize value for '{column}': {e}"))
        })?;
        Ok(self.set_value(column, json))
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

impl ConditionBuilder for UpdateQb {
    fn conditions_mut(&mut self) -> &mut ConditionList {
        &mut self.where_list
    }
}

impl SqlQb for UpdateQb {
    fn render(&self) -> SqlResult<Fragment> {
        if self.table.trim().is_empty() {
            return Err(SqlError::validation("UPDATE requires a table name"));
        }
        if self.assignments.is_empty() {
            return Err(SqlError::validation("UPDATE requires at least one assignment; call set()"));
        }

        let mut w = SqlWriter::new();
        w.push("UPDATE ").push(&self.table).push(" SET ");
        w.push_separated(&self.assignments, ", ", |w, (col, value)| {
            w.push(col).push(" = ").push_bind(value.clone());
        });

        self.where_list.write_clause("WHERE", &mut w)?;

        if !self.returning_cols.is_empty() {
            w.push(" RETURNING ").push(&self.returning_cols.join(", "));
        }
        Ok(w.finish())
    }
}

impl MutationQb for UpdateQb {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_update() {
        let frag = UpdateQb::new("users")
            .set(Record::new().with("name", "new_name"))
            .where_eq("id", 1)
            .render()
            .unwrap();
        assert_eq!(frag.sql, "UPDATE users SET name = ? WHERE id = ?");
        assert_eq!(frag.bindings, vec![Value::from("new_name"), Value::from(1)]);
    }

    #[test]
    fn test_set_merges() {
        let sql = UpdateQb::new("users")
            .set(Record::new().with("name", "a").with("status", "x"))
            .set_value("name", "b")
            .set(Record::new().with("age", 3))
            .to_sql()
            .unwrap();
        assert_eq!(sql, "UPDATE users SET name = ?, status = ?, age = ?");
    }

    #[test]
    fn test_update_with_returning() {
        let sql = UpdateQb::new("users")
            .set_value("status", "active")
            .where_in("id", [1, 2])
            .unwrap()
            .returning("*")
            .to_sql()
            .unwrap();
        assert_eq!(sql, "UPDATE users SET status = ? WHERE id IN (?, ?) RETURNING *");
    }

    #[test]
    fn test_set_json() {
        let frag = UpdateQb::new("users")
            .set_json("meta", &serde_json::json!({"a": 1}))
            .unwrap()
            .render()
            .unwrap();
        assert_eq!(frag.bindings, vec![Value::Json(serde_json::json!({"a": 1}))]);
    }

    #[test]
    fn test_requires_assignments() {
        let err = UpdateQb::new("users").where_eq("id", 1).render().unwrap_err();
        assert!(err.is_validation());
        assert!(UpdateQb::default().set_value("a", 1).render().is_err());
    }
}
