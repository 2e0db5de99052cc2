//! Row records and typed mapping.
//!
//! A [`Record`] is an ordered `column -> Value` map. It is the input shape for
//! INSERT rows, UPDATE assignments and the record form of WHERE, and the
//! output shape of executed SELECTs (keyed by projection output names).

use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use uuid::Uuid;

/// Ordered mapping from column name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Chainable insert: `Record::new().with("name", "A").with("email", "a@x")`.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Insert or replace a column value.
    ///
    /// Replacing keeps the column's original position.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(column.into(), value.into())
    }

    /// Get the raw value of a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Whether the record has a column.
    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Column names, in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.fields.iter()
    }

    /// Merge another record into this one; later values win.
    pub fn merge(&mut self, other: Record) {
        self.fields.extend(other.fields);
    }

    /// Typed column access, returning [`SqlError::Decode`] on a missing column
    /// or a type mismatch.
    pub fn try_get<T: FromValue>(&self, column: &str) -> SqlResult<T> {
        let value = self
            .fields
            .get(column)
            .ok_or_else(|| SqlError::decode(column, "column not present in record"))?;
        T::from_value(value).map_err(|message| SqlError::decode(column, message))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Record {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Conversion from a single [`Value`] into a Rust type.
pub trait FromValue: Sized {
    /// Convert, returning a human readable message on mismatch.
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, got: &Value) -> String {
    format!("expected {expected}, got {}", got.type_name())
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(v) => Ok(*v),
            other => Err(mismatch("int", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|e| e.to_string())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Decimal(v) => v
                .to_f64()
                .ok_or_else(|| format!("decimal {v} does not fit in f64")),
            other => Err(mismatch("float", other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Decimal(v) => Ok(*v),
            Value::Int(v) => Ok(Decimal::from(*v)),
            other => Err(mismatch("decimal", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            other => Err(mismatch("text", other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            other => Err(mismatch("json", other)),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Uuid(v) => Ok(*v),
            other => Err(mismatch("uuid", other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            other => Err(mismatch("timestamp", other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Date(v) => Ok(*v),
            other => Err(mismatch("date", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Trait for types that can be built from a result record.
pub trait FromRecord: Sized {
    /// Convert a record into Self
    fn from_record(record: &Record) -> SqlResult<Self>;
}

impl FromRecord for Record {
    fn from_record(record: &Record) -> SqlResult<Self> {
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct User {
        id: i64,
        name: String,
        email: Option<String>,
    }

    impl FromRecord for User {
        fn from_record(record: &Record) -> SqlResult<Self> {
            Ok(Self {
                id: record.try_get("id")?,
                name: record.try_get("name")?,
                email: record.try_get("email")?,
            })
        }
    }

    #[test]
    fn keeps_insertion_order() {
        let rec = Record::new().with("name", "A").with("email", "a@x").with("age", 3);
        assert_eq!(rec.columns().collect::<Vec<_>>(), vec!["name", "email", "age"]);
    }

    #[test]
    fn replacing_keeps_position() {
        let mut rec = Record::from([("a", 1), ("b", 2)]);
        rec.insert("a", 10);
        assert_eq!(rec.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(rec.get("a"), Some(&Value::Int(10)));
    }

    #[test]
    fn maps_into_struct() {
        let rec = Record::new()
            .with("id", 7)
            .with("name", "alice")
            .with("email", Value::Null);
        let user = User::from_record(&rec).unwrap();
        assert_eq!(
            user,
            User {
                id: 7,
                name: "alice".into(),
                email: None
            }
        );
    }

    #[test]
    fn decimal_reads_as_float() {
        let rec = Record::new().with("avg", Decimal::new(295, 1));
        assert_eq!(rec.try_get::<f64>("avg").unwrap(), 29.5);
        assert_eq!(rec.try_get::<Decimal>("avg").unwrap(), Decimal::new(295, 1));
        assert!(rec.try_get::<i64>("avg").is_err());
    }

    #[test]
    fn decode_error_names_column() {
        let rec = Record::new().with("id", "not a number");
        let err = rec.try_get::<i64>("id").unwrap_err();
        assert!(matches!(err, SqlError::Decode { ref column, .. } if column == "id"));

        let err = rec.try_get::<i64>("missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
