//! Clause model value types: operators, conjunctions, joins, ordering.

use crate::error::SqlError;
use crate::qb::render::SqlWriter;
use std::fmt;
use std::str::FromStr;

/// Comparison operator for conditions and join predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Ne,
    Like,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::Ne => "!=",
            Op::Like => "LIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Op {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Op::Eq),
            ">" => Ok(Op::Gt),
            "<" => Ok(Op::Lt),
            ">=" => Ok(Op::Gte),
            "<=" => Ok(Op::Lte),
            "!=" => Ok(Op::Ne),
            other if other.eq_ignore_ascii_case("LIKE") => Ok(Op::Like),
            other => Err(SqlError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl TryFrom<&str> for Op {
    type Error = SqlError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for Op {
    type Error = SqlError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Boolean operator joining a condition to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub(crate) fn write_to(&self, w: &mut SqlWriter) {
        w.push(&self.column).push(" ").push(self.direction.as_str());
    }
}

/// Join type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// `left op right` column predicate of a join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOn {
    pub left: String,
    pub op: Op,
    pub right: String,
}

/// JOIN clause. Cross joins carry no predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub on: Option<JoinOn>,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<String>, on: JoinOn) -> Self {
        Self {
            kind,
            table: table.into(),
            on: Some(on),
        }
    }

    pub fn cross(table: impl Into<String>) -> Self {
        Self {
            kind: JoinKind::Cross,
            table: table.into(),
            on: None,
        }
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) {
        w.push(self.kind.keyword()).push(" ").push(&self.table);
        if let Some(on) = &self.on {
            w.push(" ON ")
                .push(&on.left)
                .push(" ")
                .push(on.op.as_str())
                .push(" ")
                .push(&on.right);
        }
    }
}
