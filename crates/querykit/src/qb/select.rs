//! SELECT query builder.

use crate::error::{SqlError, SqlResult};
use crate::qb::clause::{Conjunction, Direction, Join, JoinKind, JoinOn, Op, OrderBy};
use crate::qb::condition::{ConditionBuilder, ConditionKind, ConditionList, Condition, Where};
use crate::qb::expr::{Aggregate, AggregateFunc, Column, ExprRegistry, Projection, Renderable};
use crate::qb::render::{Fragment, SqlWriter};
use crate::qb::traits::SqlQb;
use crate::value::Value;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Union {
    all: bool,
    query: Box<SelectQb>,
}

/// SELECT query builder.
///
/// Clauses render in a fixed order regardless of call order:
/// `SELECT [DISTINCT] .. FROM .. JOIN .. WHERE .. GROUP BY .. HAVING ..
/// ORDER BY .. LIMIT .. OFFSET ..`, followed by any `UNION [ALL]` branches.
#[derive(Clone, Debug, Default)]
pub struct SelectQb {
    /// FROM table (required at render)
    table: String,
    distinct: bool,
    /// Projection list (empty renders `*`)
    projection: Vec<Projection>,
    joins: Vec<Join>,
    where_list: ConditionList,
    group_by: Vec<String>,
    having: ConditionList,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    unions: Vec<Union>,
}

impl SelectQb {
    /// Create a new SELECT query builder for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Set (or replace) the FROM table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    // ==================== Projection ====================

    /// Append one projected column or expression text.
    pub fn select(mut self, col: impl Into<String>) -> Self {
        self.projection.push(Arc::new(Column::new(col)));
        self
    }

    /// Append several projected columns.
    pub fn select_cols(mut self, cols: &[&str]) -> Self {
        for col in cols {
            self.projection.push(Arc::new(Column::new(*col)));
        }
        self
    }

    /// Append any renderable expression (for example a [`CaseExpr`](crate::qb::CaseExpr)).
    pub fn select_expr(mut self, expr: impl Renderable + 'static) -> Self {
        self.projection.push(Arc::new(expr));
        self
    }

    /// Append an already shared projection entry.
    pub fn select_shared(mut self, expr: Projection) -> Self {
        self.projection.push(expr);
        self
    }

    /// Append the expression registered under `name`.
    pub fn select_named(self, registry: &ExprRegistry, name: &str) -> SqlResult<Self> {
        let expr = registry.get(name)?;
        Ok(self.select_shared(expr))
    }

    /// `SELECT DISTINCT`
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    fn aggregate(self, func: AggregateFunc, col: impl Into<String>) -> Self {
        self.select_expr(Aggregate::new(func, col))
    }

    /// Append `COUNT(col)`. Nothing is executed.
    pub fn count(self, col: impl Into<String>) -> Self {
        self.aggregate(AggregateFunc::Count, col)
    }

    /// Append `AVG(col)`.
    pub fn avg(self, col: impl Into<String>) -> Self {
        self.aggregate(AggregateFunc::Avg, col)
    }

    /// Append `SUM(col)`.
    pub fn sum(self, col: impl Into<String>) -> Self {
        self.aggregate(AggregateFunc::Sum, col)
    }

    /// Append `MIN(col)`.
    pub fn min(self, col: impl Into<String>) -> Self {
        self.aggregate(AggregateFunc::Min, col)
    }

    /// Append `MAX(col)`.
    pub fn max(self, col: impl Into<String>) -> Self {
        self.aggregate(AggregateFunc::Max, col)
    }

    // ==================== JOIN ====================

    fn push_join<O>(
        mut self,
        kind: JoinKind,
        table: impl Into<String>,
        left: impl Into<String>,
        op: O,
        right: impl Into<String>,
    ) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        let on = JoinOn {
            left: left.into(),
            op: op.try_into()?,
            right: right.into(),
        };
        self.joins.push(Join::new(kind, table, on));
        Ok(self)
    }

    /// `INNER JOIN table ON left op right`
    pub fn join<O>(
        self,
        table: impl Into<String>,
        left: impl Into<String>,
        op: O,
        right: impl Into<String>,
    ) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        self.push_join(JoinKind::Inner, table, left, op, right)
    }

    /// `LEFT JOIN table ON left op right`
    pub fn left_join<O>(
        self,
        table: impl Into<String>,
        left: impl Into<String>,
        op: O,
        right: impl Into<String>,
    ) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        self.push_join(JoinKind::Left, table, left, op, right)
    }

    /// `RIGHT JOIN table ON left op right`
    pub fn right_join<O>(
        self,
        table: impl Into<String>,
        left: impl Into<String>,
        op: O,
        right: impl Into<String>,
    ) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        self.push_join(JoinKind::Right, table, left, op, right)
    }

    /// `CROSS JOIN table`
    pub fn cross_join(mut self, table: impl Into<String>) -> Self {
        self.joins.push(Join::cross(table));
        self
    }

    // ==================== GROUP BY / HAVING ====================

    /// Append GROUP BY columns.
    pub fn group_by(mut self, cols: &[&str]) -> Self {
        self.group_by.extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// HAVING with the full condition surface of WHERE.
    ///
    /// ```
    /// use querykit::qb::{self, ConditionBuilder};
    /// use querykit::SqlQb;
    ///
    /// let sql = qb::select("orders")
    ///     .select("status")
    ///     .group_by(&["status"])
    ///     .having(|h| Ok(h.where_in("status", ["paid", "sent"])?.where_not_null("status")))?
    ///     .to_sql()?;
    /// assert_eq!(
    ///     sql,
    ///     "SELECT status FROM orders GROUP BY status HAVING status IN (?, ?) AND status IS NOT NULL"
    /// );
    /// # Ok::<(), querykit::SqlError>(())
    /// ```
    pub fn having<F>(mut self, build: F) -> SqlResult<Self>
    where
        F: FnOnce(ConditionList) -> SqlResult<ConditionList>,
    {
        self.having = build(std::mem::take(&mut self.having))?;
        Ok(self)
    }

    /// HAVING: `column = value`
    pub fn having_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.having.push_where(Where::eq(column, value), Conjunction::And);
        self
    }

    /// HAVING: `column op value`
    pub fn having_op<O>(mut self, column: impl Into<String>, op: O, value: impl Into<Value>) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        let op = op.try_into()?;
        self.having.push_where(Where::cmp(column, op, value), Conjunction::And);
        Ok(self)
    }

    /// HAVING: `OR column op value`
    pub fn or_having_op<O>(mut self, column: impl Into<String>, op: O, value: impl Into<Value>) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        let op = op.try_into()?;
        self.having.push_where(Where::cmp(column, op, value), Conjunction::Or);
        Ok(self)
    }

    /// HAVING: verbatim SQL with the values its placeholders consume.
    pub fn having_raw(mut self, sql: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        self.having.push(Condition::new(
            ConditionKind::Raw {
                sql: sql.into(),
                values: values.into_iter().collect(),
            },
            Conjunction::And,
        ));
        self
    }

    // ==================== ORDER BY / LIMIT / OFFSET ====================

    /// `ORDER BY column ASC`
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction: Direction::Asc,
        });
        self
    }

    /// `ORDER BY column DESC`
    pub fn order_by_desc(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction: Direction::Desc,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// 1-based page: `LIMIT per_page OFFSET (page - 1) * per_page`.
    pub fn page(self, page: i64, per_page: i64) -> SqlResult<Self> {
        if page < 1 {
            return Err(SqlError::validation(format!("page must be >= 1, got {page}")));
        }
        if per_page <= 0 {
            return Err(SqlError::validation(format!(
                "per_page must be > 0, got {per_page}"
            )));
        }
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| SqlError::validation("page offset overflows"))?;
        Ok(self.limit(per_page as u64).offset(offset as u64))
    }

    // ==================== UNION ====================

    /// `<this> UNION <other>`
    pub fn union(mut self, other: SelectQb) -> Self {
        self.unions.push(Union {
            all: false,
            query: Box::new(other),
        });
        self
    }

    /// `<this> UNION ALL <other>`
    pub fn union_all(mut self, other: SelectQb) -> Self {
        self.unions.push(Union {
            all: true,
            query: Box::new(other),
        });
        self
    }

    // ==================== Rendering ====================

    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> SqlResult<()> {
        if self.table.trim().is_empty() {
            return Err(SqlError::validation("SELECT requires a table name"));
        }

        w.push(if self.distinct { "SELECT DISTINCT " } else { "SELECT " });
        if self.projection.is_empty() {
            w.push("*");
        } else {
            for (i, expr) in self.projection.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push_fragment(expr.render()?);
            }
        }
        w.push(" FROM ").push(&self.table);

        for join in &self.joins {
            w.push(" ");
            join.write_to(w);
        }

        self.where_list.write_clause("WHERE", w)?;

        if !self.group_by.is_empty() {
            w.push(" GROUP BY ").push(&self.group_by.join(", "));
        }

        self.having.write_clause("HAVING", w)?;

        if !self.order_by.is_empty() {
            w.push(" ORDER BY ");
            w.push_separated(&self.order_by, ", ", |w, o| o.write_to(w));
        }
        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {offset}"));
        }

        for union in &self.unions {
            w.push(if union.all { " UNION ALL " } else { " UNION " });
            union.query.write_to(w)?;
        }
        Ok(())
    }
}

impl ConditionBuilder for SelectQb {
    fn conditions_mut(&mut self) -> &mut ConditionList {
        &mut self.where_list
    }
}

impl SqlQb for SelectQb {
    fn render(&self) -> SqlResult<Fragment> {
        let mut w = SqlWriter::new();
        self.write_to(&mut w)?;
        Ok(w.finish())
    }
}
