//! Projection expressions.
//!
//! A SELECT projection list holds [`Projection`] values: shared trait objects
//! implementing [`Renderable`]. The SELECT renderer only calls
//! [`Renderable::render`] and splices the result, so new expression kinds
//! (see [`CaseExpr`](crate::qb::CaseExpr)) plug in without touching it.

use crate::error::{SqlError, SqlResult};
use crate::qb::render::Fragment;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Anything that renders to a SQL fragment with its own bindings.
pub trait Renderable: fmt::Debug + Send + Sync {
    /// Render to `(sql, bindings)`.
    fn render(&self) -> SqlResult<Fragment>;
}

/// One projection-list entry.
pub type Projection = Arc<dyn Renderable>;

/// A bare column or `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column(pub String);

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Renderable for Column {
    fn render(&self) -> SqlResult<Fragment> {
        Ok(Fragment::raw(self.0.clone()))
    }
}

/// Aggregate function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Avg,
    Sum,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
        }
    }
}

/// `FUNC(column) [AS alias]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub func: AggregateFunc,
    pub column: String,
    pub alias: Option<String>,
}

impl Aggregate {
    pub fn new(func: AggregateFunc, column: impl Into<String>) -> Self {
        Self {
            func,
            column: column.into(),
            alias: None,
        }
    }

    pub fn count(column: impl Into<String>) -> Self {
        Self::new(AggregateFunc::Count, column)
    }

    pub fn avg(column: impl Into<String>) -> Self {
        Self::new(AggregateFunc::Avg, column)
    }

    pub fn sum(column: impl Into<String>) -> Self {
        Self::new(AggregateFunc::Sum, column)
    }

    pub fn min(column: impl Into<String>) -> Self {
        Self::new(AggregateFunc::Min, column)
    }

    pub fn max(column: impl Into<String>) -> Self {
        Self::new(AggregateFunc::Max, column)
    }

    /// Set the output column name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl Renderable for Aggregate {
    fn render(&self) -> SqlResult<Fragment> {
        let mut sql = format!("{}({})", self.func.as_str(), self.column);
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        Ok(Fragment::raw(sql))
    }
}

/// Named, reusable projection expressions.
///
/// Register an expression once and pull it into any number of SELECT
/// builders with [`SelectQb::select_named`](crate::qb::SelectQb::select_named).
#[derive(Debug, Clone, Default)]
pub struct ExprRegistry {
    entries: BTreeMap<String, Projection>,
}

impl ExprRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `expr` under `name`, returning the entry it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        expr: impl Renderable + 'static,
    ) -> Option<Projection> {
        self.entries.insert(name.into(), Arc::new(expr))
    }

    /// Look up an expression, failing with a validation error if unknown.
    pub fn get(&self, name: &str) -> SqlResult<Projection> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| SqlError::validation(format!("no expression registered as '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
