//! Rendering primitives shared by every builder.
//!
//! [`SqlWriter`] accumulates SQL text and bindings side by side. Text and the
//! matching binding are always pushed in the same call, so the i-th `?` in the
//! output corresponds to `bindings[i]` by construction. Nested statements are
//! spliced with [`SqlWriter::push_fragment`], which appends their text and
//! bindings at the current position.

use crate::value::Value;
use serde::Serialize;
use std::fmt;

/// The placeholder token emitted for every bound value.
pub const PLACEHOLDER: char = '?';

/// Rendered SQL text plus its positional bindings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fragment {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// A fragment without bindings.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Split into `(sql, bindings)`.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.bindings)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Append-only writer for SQL text and bindings.
#[derive(Debug, Default)]
pub struct SqlWriter {
    sql: String,
    bindings: Vec<Value>,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw SQL text (no bindings).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append one placeholder and bind its value.
    pub fn push_bind(&mut self, value: Value) -> &mut Self {
        self.sql.push(PLACEHOLDER);
        self.bindings.push(value);
        self
    }

    /// Append a comma-separated placeholder list, binding each value.
    pub fn push_bind_list<'a>(&mut self, values: impl IntoIterator<Item = &'a Value>) -> &mut Self {
        for (i, v) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_bind(v.clone());
        }
        self
    }

    /// Append caller-supplied SQL together with the values its placeholders
    /// consume. The text is not inspected.
    pub fn push_raw_with(&mut self, sql: &str, values: &[Value]) -> &mut Self {
        self.sql.push_str(sql);
        self.bindings.extend(values.iter().cloned());
        self
    }

    /// Splice a rendered fragment at the current position.
    pub fn push_fragment(&mut self, fragment: Fragment) -> &mut Self {
        self.sql.push_str(&fragment.sql);
        self.bindings.extend(fragment.bindings);
        self
    }

    /// Append items separated by `sep`, rendering each with `f`.
    pub fn push_separated<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        sep: &str,
        mut f: impl FnMut(&mut Self, T),
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            f(self, item);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn finish(self) -> Fragment {
        Fragment {
            sql: self.sql,
            bindings: self.bindings,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Literal,
    Identifier,
    LineComment,
    BlockComment,
}

/// Byte offsets of `?` placeholders in `sql`.
///
/// Skips `'string literals'`, `"quoted identifiers"`, `-- line comments` and
/// `/* block comments */`. A doubled quote inside a literal or identifier
/// closes and reopens it, which leaves the scan state unchanged.
pub fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut offsets = Vec::new();
    let mut state = Scan::Code;
    let mut i = 0;
    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        match (state, bytes[i]) {
            (Scan::Code, b'\'') => state = Scan::Literal,
            (Scan::Code, b'"') => state = Scan::Identifier,
            (Scan::Code, b'-') if next == Some(b'-') => {
                state = Scan::LineComment;
                i += 1;
            }
            (Scan::Code, b'/') if next == Some(b'*') => {
                state = Scan::BlockComment;
                i += 1;
            }
            (Scan::Code, b) if b as char == PLACEHOLDER => offsets.push(i),
            (Scan::Literal, b'\'') | (Scan::Identifier, b'"') | (Scan::LineComment, b'\n') => {
                state = Scan::Code;
            }
            (Scan::BlockComment, b'*') if next == Some(b'/') => {
                state = Scan::Code;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    offsets
}

/// Count `?` placeholders, ignoring any inside literals, quoted identifiers
/// or comments.
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_offsets(sql).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_follow_bindings() {
        let mut w = SqlWriter::new();
        w.push("SELECT * FROM users WHERE a = ")
            .push_bind(Value::from(1))
            .push(" AND b IN (")
            .push_bind_list(&[Value::from("x"), Value::from("y")])
            .push(")");
        let frag = w.finish();
        assert_eq!(frag.sql, "SELECT * FROM users WHERE a = ? AND b IN (?, ?)");
        assert_eq!(frag.bindings, vec![Value::from(1), Value::from("x"), Value::from("y")]);
    }

    #[test]
    fn splices_at_position() {
        let inner = Fragment::new("SELECT 1 FROM t WHERE x = ?", vec![Value::from(2)]);
        let mut w = SqlWriter::new();
        w.push("a = ").push_bind(Value::from(1));
        w.push(" AND EXISTS (").push_fragment(inner).push(") AND c = ");
        w.push_bind(Value::from(3));
        let frag = w.finish();
        assert_eq!(frag.sql, "a = ? AND EXISTS (SELECT 1 FROM t WHERE x = ?) AND c = ?");
        assert_eq!(frag.bindings, vec![Value::from(1), Value::from(2), Value::from(3)]);
    }

    #[test]
    fn counts_outside_literals() {
        assert_eq!(count_placeholders("a = ? AND b = '?' AND c = ?"), 2);
        assert_eq!(count_placeholders("SELECT 1"), 0);
    }

    #[test]
    fn skips_identifiers_and_comments() {
        assert_eq!(count_placeholders(r#"SELECT "why?" FROM t WHERE a = ?"#), 1);
        assert_eq!(count_placeholders("a = ? -- really?\nAND b = ?"), 2);
        assert_eq!(count_placeholders("a = /* ? */ ?"), 1);
        assert_eq!(count_placeholders("a = 'it''s?' AND b = ?"), 1);
        assert_eq!(placeholder_offsets("x = ? - ?"), vec![4, 8]);
    }
}
