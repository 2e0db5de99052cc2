//! CASE expressions for projection lists.
//!
//! # Example
//!
//! ```
//! use querykit::qb::{self, CaseExpr, Op};
//! use querykit::SqlQb;
//!
//! let age_group = CaseExpr::searched()
//!     .when_cmp("age", Op::Lt, 18).then("Minor")?
//!     .when_cmp("age", Op::Lt, 65).then("Adult")?
//!     .otherwise("Senior")
//!     .alias("age_group");
//!
//! let sql = qb::select("users").select("name").select_expr(age_group).to_sql()?;
//! assert_eq!(
//!     sql,
//!     "SELECT name, CASE WHEN age < ? THEN ? WHEN age < ? THEN ? ELSE ? END AS age_group FROM users"
//! );
//! # Ok::<(), querykit::SqlError>(())
//! ```

use crate::error::{SqlError, SqlResult};
use crate::qb::clause::Op;
use crate::qb::expr::Renderable;
use crate::qb::render::{Fragment, SqlWriter};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum WhenPredicate {
    /// Compared for equality against the subject.
    Value(Value),
    /// `column op ?`
    Compare { column: String, op: Op, value: Value },
    /// Verbatim SQL.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Arm {
    when: WhenPredicate,
    then: Value,
}

/// `CASE [subject] WHEN .. THEN .. [ELSE ..] END [AS alias]`
///
/// Pairs are collected in call order. `then` must directly follow one of the
/// `when*` calls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseExpr {
    subject: Option<String>,
    arms: Vec<Arm>,
    pending: Option<WhenPredicate>,
    dangling_when: bool,
    otherwise: Option<Value>,
    alias: Option<String>,
}

impl CaseExpr {
    /// CASE without a subject; every WHEN carries its own predicate.
    pub fn searched() -> Self {
        Self::default()
    }

    /// CASE comparing `subject` against each WHEN value.
    pub fn simple(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    fn push_when(mut self, when: WhenPredicate) -> Self {
        self.close_pending();
        self.pending = Some(when);
        self
    }

    /// A WHEN still waiting for its THEN can no longer get one.
    fn close_pending(&mut self) {
        if self.pending.take().is_some() {
            self.dangling_when = true;
        }
    }

    /// `WHEN ?` (simple form).
    pub fn when(self, value: impl Into<Value>) -> Self {
        self.push_when(WhenPredicate::Value(value.into()))
    }

    /// `WHEN column op ?` (searched form).
    pub fn when_cmp(self, column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        self.push_when(WhenPredicate::Compare {
            column: column.into(),
            op,
            value: value.into(),
        })
    }

    /// Like [`when_cmp`](Self::when_cmp), parsing the operator.
    pub fn when_op<O>(self, column: impl Into<String>, op: O, value: impl Into<Value>) -> SqlResult<Self>
    where
        O: TryInto<Op>,
        SqlError: From<O::Error>,
    {
        let op = op.try_into()?;
        Ok(self.when_cmp(column, op, value))
    }

    /// `WHEN <sql>` with the text used verbatim.
    pub fn when_raw(self, sql: impl Into<String>) -> Self {
        self.push_when(WhenPredicate::Raw(sql.into()))
    }

    /// Result for the preceding WHEN.
    pub fn then(mut self, value: impl Into<Value>) -> SqlResult<Self> {
        let when = self
            .pending
            .take()
            .ok_or_else(|| SqlError::validation("CASE then() must directly follow a when() call"))?;
        self.arms.push(Arm {
            when,
            then: value.into(),
        });
        Ok(self)
    }

    /// `ELSE ?`
    pub fn otherwise(mut self, value: impl Into<Value>) -> Self {
        self.close_pending();
        self.otherwise = Some(value.into());
        self
    }

    /// `AS alias`
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.close_pending();
        self.alias = Some(alias.into());
        self
    }

    pub fn is_simple(&self) -> bool {
        self.subject.is_some()
    }

    fn check(&self) -> SqlResult<()> {
        if self.pending.is_some() || self.dangling_when {
            return Err(SqlError::validation("CASE when() without a matching then()"));
        }
        if self.arms.is_empty() {
            return Err(SqlError::validation(
                "CASE expression requires at least one WHEN/THEN pair",
            ));
        }
        for arm in &self.arms {
            match (&arm.when, self.is_simple()) {
                (WhenPredicate::Value(_), false) => {
                    return Err(SqlError::validation(
                        "CASE when(value) requires a subject; use CaseExpr::simple",
                    ));
                }
                (WhenPredicate::Compare { .. }, true) => {
                    return Err(SqlError::validation(
                        "CASE with a subject cannot take column comparisons",
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Renderable for CaseExpr {
    fn render(&self) -> SqlResult<Fragment> {
        self.check()?;

        let mut w = SqlWriter::new();
        w.push("CASE");
        if let Some(subject) = &self.subject {
            w.push(" ").push(subject);
        }
        for arm in &self.arms {
            w.push(" WHEN ");
            match &arm.when {
                WhenPredicate::Value(v) => {
                    w.push_bind(v.clone());
                }
                WhenPredicate::Compare { column, op, value } => {
                    w.push(column).push(" ").push(op.as_str()).push(" ");
                    w.push_bind(value.clone());
                }
                WhenPredicate::Raw(sql) => {
                    w.push(sql);
                }
            }
            w.push(" THEN ").push_bind(arm.then.clone());
        }
        if let Some(v) = &self.otherwise {
            w.push(" ELSE ").push_bind(v.clone());
        }
        w.push(" END");
        if let Some(alias) = &self.alias {
            w.push(" AS ").push(alias);
        }
        Ok(w.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searched_case_binds_per_pair_then_else() {
        let frag = CaseExpr::searched()
            .when_cmp("age", Op::Lt, 18)
            .then("Minor")
            .unwrap()
            .when_op("age", "<", 65)
            .unwrap()
            .then("Adult")
            .unwrap()
            .otherwise("Senior")
            .alias("age_group")
            .render()
            .unwrap();
        assert_eq!(
            frag.sql,
            "CASE WHEN age < ? THEN ? WHEN age < ? THEN ? ELSE ? END AS age_group"
        );
        assert_eq!(
            frag.bindings,
            vec![
                Value::from(18),
                Value::from("Minor"),
                Value::from(65),
                Value::from("Adult"),
                Value::from("Senior"),
            ]
        );
    }

    #[test]
    fn simple_case() {
        let frag = CaseExpr::simple("status")
            .when("a")
            .then(1)
            .unwrap()
            .when("b")
            .then(2)
            .unwrap()
            .render()
            .unwrap();
        assert_eq!(frag.sql, "CASE status WHEN ? THEN ? WHEN ? THEN ? END");
        assert_eq!(frag.bindings.len(), 4);
    }

    #[test]
    fn raw_when_has_no_binding() {
        let frag = CaseExpr::searched()
            .when_raw("score IS NULL")
            .then(0)
            .unwrap()
            .render()
            .unwrap();
        assert_eq!(frag.sql, "CASE WHEN score IS NULL THEN ? END");
        assert_eq!(frag.bindings, vec![Value::from(0)]);
    }

    #[test]
    fn then_without_when() {
        let err = CaseExpr::searched().then("x").unwrap_err();
        assert!(err.is_validation());

        let err = CaseExpr::searched()
            .when_cmp("a", Op::Eq, 1)
            .then("x")
            .unwrap()
            .then("y")
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn then_after_otherwise_or_alias_is_rejected() {
        let err = CaseExpr::searched()
            .when_cmp("a", Op::Eq, 1)
            .otherwise("else")
            .alias("x")
            .then("late")
            .unwrap_err();
        assert!(err.is_validation());

        let err = CaseExpr::searched().when_cmp("a", Op::Eq, 1).alias("x").then("late").unwrap_err();
        assert!(err.is_validation());

        let case = CaseExpr::searched()
            .when_cmp("a", Op::Eq, 1)
            .then("x")
            .unwrap()
            .when_cmp("b", Op::Eq, 2)
            .otherwise("y");
        assert!(case.render().unwrap_err().is_validation());
    }

    #[test]
    fn render_requires_pairs() {
        assert!(CaseExpr::searched().render().unwrap_err().is_validation());
        assert!(CaseExpr::simple("s").otherwise(1).render().unwrap_err().is_validation());
    }

    #[test]
    fn unmatched_when_fails_render() {
        let case = CaseExpr::searched()
            .when_cmp("a", Op::Eq, 1)
            .when_cmp("b", Op::Eq, 2)
            .then("x")
            .unwrap();
        assert!(case.render().unwrap_err().is_validation());
        assert!(CaseExpr::simple("s").when(1).render().is_err());
    }

    #[test]
    fn forms_do_not_mix() {
        let no_subject = CaseExpr::searched().when(1).then("x").unwrap();
        assert!(no_subject.render().unwrap_err().is_validation());

        let with_subject = CaseExpr::simple("s").when_cmp("a", Op::Gt, 1).then("x").unwrap();
        assert!(with_subject.render().unwrap_err().is_validation());
    }

    #[test]
    fn bad_operator() {
        let err = CaseExpr::searched().when_op("a", "=~", 1).unwrap_err();
        assert!(err.is_unsupported_operator());
    }
}
