//! Condition nodes for WHERE/HAVING and the shared builder surface that
//! produces them.
//!
//! Every `where_*` call appends exactly one [`Condition`] (the record form
//! appends one per entry) to a [`ConditionList`]. Each condition remembers the
//! [`Conjunction`] that joins it to its predecessor; the first condition's
//! conjunction is never rendered.

use crate::error::{SqlError, SqlResult};
use crate::qb::clause::{Conjunction, Op};
use crate::qb::render::{Fragment, SqlWriter};
use crate::qb::select::SelectQb;
use crate::qb::traits::SqlQb;
use crate::record::Record;
use crate::value::Value;

/// A nested query used by EXISTS / IN conditions.
#[derive(Debug, Clone)]
pub enum SubQuery {
    /// A builder; its bindings splice into the outer statement.
    Query(Box<SelectQb>),
    /// Caller-written SQL without bindings.
    Raw(String),
}

impl SubQuery {
    fn render(&self) -> SqlResult<Fragment> {
        match self {
            SubQuery::Query(q) => q.render(),
            SubQuery::Raw(sql) => Ok(Fragment::raw(sql.clone())),
        }
    }
}

impl From<SelectQb> for SubQuery {
    fn from(q: SelectQb) -> Self {
        SubQuery::Query(Box::new(q))
    }
}

impl From<&str> for SubQuery {
    fn from(sql: &str) -> Self {
        SubQuery::Raw(sql.to_string())
    }
}

impl From<String> for SubQuery {
    fn from(sql: String) -> Self {
        SubQuery::Raw(sql)
    }
}

/// What a condition tests.
#[derive(Debug, Clone)]
pub enum ConditionKind {
    /// `column op ?`
    Compare { column: String, op: Op, value: Value },
    /// `column [NOT] IN (?, ...)`; `values` is never empty.
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// `column [NOT] IN (<subquery>)`
    InSubquery {
        column: String,
        query: SubQuery,
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: String, negated: bool },
    /// `column BETWEEN ? AND ?`
    Between { column: String, low: Value, high: Value },
    /// Verbatim SQL plus the values its placeholders consume.
    Raw { sql: String, values: Vec<Value> },
    /// `[NOT] EXISTS (<subquery>)`
    Exists { query: SubQuery, negated: bool },
}

/// One WHERE/HAVING condition with its leading conjunction.
#[derive(Debug, Clone)]
pub struct Condition {
    pub kind: ConditionKind,
    pub conjunction: Conjunction,
}

impl Condition {
    pub fn new(kind: ConditionKind, conjunction: Conjunction) -> Self {
        Self { kind, conjunction }
    }

    /// Column the condition tests, if any.
    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            ConditionKind::Compare { column, .. }
            | ConditionKind::In { column, .. }
            | ConditionKind::InSubquery { column, .. }
            | ConditionKind::Null { column, .. }
            | ConditionKind::Between { column, .. } => Some(column),
            ConditionKind::Raw { .. } | ConditionKind::Exists { .. } => None,
        }
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> SqlResult<()> {
        match &self.kind {
            ConditionKind::Compare { column, op, value } => {
                w.push(column).push(" ").push(op.as_str()).push(" ");
                w.push_bind(value.clone());
            }
            ConditionKind::In {
                column,
                values,
                negated,
            } => {
                w.push(column);
                w.push(if *negated { " NOT IN (" } else { " IN (" });
                w.push_bind_list(values).push(")");
            }
            ConditionKind::InSubquery {
                column,
                query,
                negated,
            } => {
                let inner = query.render()?;
                w.push(column);
                w.push(if *negated { " NOT IN (" } else { " IN (" });
                w.push_fragment(inner).push(")");
            }
            ConditionKind::Null { column, negated } => {
                w.push(column);
                w.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            ConditionKind::Between { column, low, high } => {
                w.push(column).push(" BETWEEN ");
                w.push_bind(low.clone()).push(" AND ").push_bind(high.clone());
            }
            ConditionKind::Raw { sql, values } => {
                w.push_raw_with(sql, values);
            }
            ConditionKind::Exists { query, negated } => {
                let inner = query.render()?;
                w.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                w.push_fragment(inner).push(")");
            }
        }
        Ok(())
    }
}

/// The closed set of comparison call shapes.
#[derive(Debug, Clone)]
pub enum Where {
    /// `column = value`
    Eq(String, Value),
    /// `column op value`
    Cmp(String, Op, Value),
    /// One `column = value` per entry, in record order, AND-joined.
    FromRecord(Record),
}

impl Where {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Where::Eq(column.into(), value.into())
    }

    pub fn cmp(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Where::Cmp(column.into(), op, value.into())
    }

    /// Expand into condition nodes. `conjunction` applies to the first node;
    /// further record entries are AND-joined.
    fn into_conditions(self, conjunction: Conjunction) -> Vec<Condition> {
        let compare = |column, op, value, conjunction| {
            Condition::new(ConditionKind::Compare { column, op, value }, conjunction)
        };
        match self {
            Where::Eq(column, value) => vec![compare(column, Op::Eq, value, conjunction)],
            Where::Cmp(column, op, value) => vec![compare(column, op, value, conjunction)],
            Where::FromRecord(record) => record
                .into_iter()
                .enumerate()
                .map(|(i, (column, value))| {
                    let conj = if i == 0 { conjunction } else { Conjunction::And };
                    compare(column, Op::Eq, value, conj)
                })
                .collect(),
        }
    }
}

impl From<Record> for Where {
    fn from(record: Record) -> Self {
        Where::FromRecord(record)
    }
}

/// Ordered list of conditions for one WHERE or HAVING clause.
#[derive(Debug, Clone, Default)]
pub struct ConditionList {
    conditions: Vec<Condition>,
}

impl ConditionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.conditions.iter()
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn push_where(&mut self, w: Where, conjunction: Conjunction) {
        self.conditions.extend(w.into_conditions(conjunction));
    }

    /// Render the clause body (without the `WHERE`/`HAVING` keyword).
    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> SqlResult<()> {
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                w.push(" ").push(condition.conjunction.as_str()).push(" ");
            }
            condition.write_to(w)?;
        }
        Ok(())
    }

    /// Render ` <keyword> <conditions>` when the list is non-empty.
    pub(crate) fn write_clause(&self, keyword: &str, w: &mut SqlWriter) -> SqlResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        w.push(" ").push(keyword).push(" ");
        self.write_to(w)
    }
}

impl ConditionBuilder for ConditionList {
    fn conditions_mut(&mut self) -> &mut ConditionList {
        self
    }
}

fn non_empty_values<V: Into<Value>>(
    column: &str,
    values: impl IntoIterator<Item = V>,
) -> SqlResult<Vec<Value>> {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return Err(SqlError::validation(format!(
            "IN list for column '{column}' must not be empty"
        )));
    }
    Ok(values)
}

/// WHERE-clause surface shared by SELECT, UPDATE and DELETE builders.
///
/// Methods consume and return the builder. Calls whose arguments can be
/// rejected up front (`where_op` with an unknown operator, an empty `where_in`)
/// return `SqlResult<Self>` so the error surfaces at the offending call.
pub trait ConditionBuilder: Sized {
    /// The builder's WHERE list.
    fn conditions_mut(&mut self) -> &mut ConditionList;

    /// Append a condition with an explicit conjunction.
    fn push_condition(mut self, kind: ConditionKind, conjunction: Conjunction) -> Self {
        self.conditions_mut().push(Condition::new(kind, conjunction));
        self
    }

    /// Append one of the [`Where`] call shapes, AND-joined.
    fn filter(mut self, w: impl Into<Where>) -> Self {
        self.conditions_mut().push_where(w.into(), Conjunction::And);
        self
    }

    /// Append one of the [`Where`] call shapes, OR-joined.
    fn or_filter(mut self, w: impl Into<Where>) -> Self {
        self.conditions_mut().push_where(w.into(), Conjunction::Or);
        self
    }

    /// `column = value`
    fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Where::eq(column, value))
    }

    /// `OR column = value`
    fn or_where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.or_filter(Where::eq(column, value))
    }

    /// `column op value`; `op` may be an [`Op`] or its SQL spelling.
    fn where_op<O>(self, column: impl Into<String>, op: O, value: impl Into<Value>) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        let op = op.try_into()?;
        Ok(self.filter(Where::cmp(column, op, value)))
    }

    /// `OR column op value`
    fn or_where_op<O>(self, column: impl Into<String>, op: O, value: impl Into<Value>) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        let op = op.try_into()?;
        Ok(self.or_filter(Where::cmp(column, op, value)))
    }

    /// One `column = value` per record entry, in record order.
    fn where_record(self, record: impl Into<Record>) -> Self {
        self.filter(Where::FromRecord(record.into()))
    }

    /// `column IN (?, ...)`. An empty sequence is a validation error.
    fn where_in<V: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> SqlResult<Self> {
        let column = column.into();
        let values = non_empty_values(&column, values)?;
        Ok(self.push_condition(
            ConditionKind::In {
                column,
                values,
                negated: false,
            },
            Conjunction::And,
        ))
    }

    /// `OR column IN (?, ...)`
    fn or_where_in<V: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> SqlResult<Self> {
        let column = column.into();
        let values = non_empty_values(&column, values)?;
        Ok(self.push_condition(
            ConditionKind::In {
                column,
                values,
                negated: false,
            },
            Conjunction::Or,
        ))
    }

    /// `column NOT IN (?, ...)`. An empty sequence is a validation error.
    fn where_not_in<V: Into<Value>>(
        self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> SqlResult<Self> {
        let column = column.into();
        let values = non_empty_values(&column, values)?;
        Ok(self.push_condition(
            ConditionKind::In {
                column,
                values,
                negated: true,
            },
            Conjunction::And,
        ))
    }

    /// `column IN (<subquery>)`
    fn where_in_subquery(self, column: impl Into<String>, query: impl Into<SubQuery>) -> Self {
        self.push_condition(
            ConditionKind::InSubquery {
                column: column.into(),
                query: query.into(),
                negated: false,
            },
            Conjunction::And,
        )
    }

    /// `column NOT IN (<subquery>)`
    fn where_not_in_subquery(self, column: impl Into<String>, query: impl Into<SubQuery>) -> Self {
        self.push_condition(
            ConditionKind::InSubquery {
                column: column.into(),
                query: query.into(),
                negated: true,
            },
            Conjunction::And,
        )
    }

    /// `column IS NULL`
    fn where_null(self, column: impl Into<String>) -> Self {
        self.push_condition(
            ConditionKind::Null {
                column: column.into(),
                negated: false,
            },
            Conjunction::And,
        )
    }

    /// `OR column IS NULL`
    fn or_where_null(self, column: impl Into<String>) -> Self {
        self.push_condition(
            ConditionKind::Null {
                column: column.into(),
                negated: false,
            },
            Conjunction::Or,
        )
    }

    /// `column IS NOT NULL`
    fn where_not_null(self, column: impl Into<String>) -> Self {
        self.push_condition(
            ConditionKind::Null {
                column: column.into(),
                negated: true,
            },
            Conjunction::And,
        )
    }

    /// `column BETWEEN ? AND ?`
    fn where_between(
        self,
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.push_condition(
            ConditionKind::Between {
                column: column.into(),
                low: low.into(),
                high: high.into(),
            },
            Conjunction::And,
        )
    }

    /// Verbatim SQL. `values` are bound in order at this position; matching
    /// them to the fragment's own `?` tokens is the caller's job.
    fn where_raw(self, sql: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        self.push_condition(
            ConditionKind::Raw {
                sql: sql.into(),
                values: values.into_iter().collect(),
            },
            Conjunction::And,
        )
    }

    /// `OR <sql>`
    fn or_where_raw(self, sql: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        self.push_condition(
            ConditionKind::Raw {
                sql: sql.into(),
                values: values.into_iter().collect(),
            },
            Conjunction::Or,
        )
    }

    /// `EXISTS (<subquery>)`
    fn where_exists(self, query: impl Into<SubQuery>) -> Self {
        self.push_condition(
            ConditionKind::Exists {
                query: query.into(),
                negated: false,
            },
            Conjunction::And,
        )
    }

    /// `NOT EXISTS (<subquery>)`
    fn where_not_exists(self, query: impl Into<SubQuery>) -> Self {
        self.push_condition(
            ConditionKind::Exists {
                query: query.into(),
                negated: true,
            },
            Conjunction::And,
        )
    }
}
