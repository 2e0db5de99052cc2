//! Cross-builder rendering tests.

use crate::qb::{
    count_placeholders, delete, insert, select, update, CaseExpr, ConditionBuilder, Fragment, Op,
    SqlQb,
};
use crate::record::Record;
use crate::value::Value;

fn assert_aligned(frag: &Fragment) {
    assert_eq!(
        frag.bindings.len(),
        count_placeholders(&frag.sql),
        "placeholder/binding mismatch in: {}",
        frag.sql
    );
}

#[test]
fn test_where_op() {
    let frag = select("users").where_op("age", ">", 18).unwrap().render().unwrap();
    assert_eq!(frag.sql, "SELECT * FROM users WHERE age > ?");
    assert_eq!(frag.bindings, vec![Value::from(18)]);
}

#[test]
fn test_where_op_then_eq() {
    let frag = select("users")
        .where_op("age", ">", 18)
        .unwrap()
        .where_eq("country", "USA")
        .render()
        .unwrap();
    assert_eq!(frag.sql, "SELECT * FROM users WHERE age > ? AND country = ?");
    assert_eq!(frag.bindings, vec![Value::from(18), Value::from("USA")]);
}

#[test]
fn test_between() {
    let frag = select("users").where_between("age", 20, 30).render().unwrap();
    assert_eq!(frag.sql, "SELECT * FROM users WHERE age BETWEEN ? AND ?");
    assert_eq!(frag.bindings, vec![Value::from(20), Value::from(30)]);
}

#[test]
fn test_page_matches_limit_offset() {
    let paged = select("users").page(2, 10).unwrap().render().unwrap();
    let manual = select("users").limit(10).offset(10).render().unwrap();
    assert_eq!(paged, manual);
    assert_eq!(paged.sql, "SELECT * FROM users LIMIT 10 OFFSET 10");
}

#[test]
fn test_insert_batch() {
    let frag = insert("users")
        .values_many([
            Record::new().with("name", "A").with("email", "a@x"),
            Record::new().with("name", "B").with("email", "b@x"),
        ])
        .render()
        .unwrap();
    assert_eq!(frag.sql, "INSERT INTO users (name, email) VALUES (?, ?), (?, ?)");
    assert_eq!(
        frag.bindings,
        vec![
            Value::from("A"),
            Value::from("a@x"),
            Value::from("B"),
            Value::from("b@x"),
        ]
    );
}

#[test]
fn test_insert_batch_missing_column() {
    let err = insert("users")
        .values(Record::new().with("name", "A").with("email", "a@x"))
        .values(Record::new().with("name", "B"))
        .render()
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_union() {
    let q1 = select("users").select("id").where_eq("role", "admin");
    let q2 = select("archived_users").select("id").where_op("age", ">", 60).unwrap();
    let r1 = q1.render().unwrap();
    let r2 = q2.render().unwrap();

    let frag = q1.union(q2).render().unwrap();
    assert_eq!(frag.sql, format!("{} UNION {}", r1.sql, r2.sql));
    assert_eq!(frag.bindings, [r1.bindings, r2.bindings].concat());
}

#[test]
fn test_union_all_chain() {
    let frag = select("a")
        .where_eq("x", 1)
        .union_all(select("b").where_eq("x", 2))
        .union(select("c").where_eq("x", 3))
        .render()
        .unwrap();
    assert_eq!(
        frag.sql,
        "SELECT * FROM a WHERE x = ? UNION ALL SELECT * FROM b WHERE x = ? UNION SELECT * FROM c WHERE x = ?"
    );
    assert_eq!(frag.bindings, vec![Value::from(1), Value::from(2), Value::from(3)]);
}

#[test]
fn test_exists_splices_bindings_in_place() {
    let orders = select("orders")
        .select("1")
        .where_raw("orders.user_id = users.id", Vec::<Value>::new())
        .where_op("orders.total", ">", 100)
        .unwrap();
    let frag = select("users")
        .where_eq("status", "active")
        .where_exists(orders)
        .where_eq("country", "NL")
        .render()
        .unwrap();
    assert_eq!(
        frag.sql,
        "SELECT * FROM users WHERE status = ? AND EXISTS (SELECT 1 FROM orders WHERE orders.user_id = users.id AND orders.total > ?) AND country = ?"
    );
    assert_eq!(
        frag.bindings,
        vec![Value::from("active"), Value::from(100), Value::from("NL")]
    );
}

#[test]
fn test_in_subquery() {
    let frag = delete("sessions")
        .where_in_subquery("user_id", select("users").select("id").where_eq("banned", true))
        .render()
        .unwrap();
    assert_eq!(
        frag.sql,
        "DELETE FROM sessions WHERE user_id IN (SELECT id FROM users WHERE banned = ?)"
    );
    assert_eq!(frag.bindings, vec![Value::from(true)]);
}

#[test]
fn test_nested_subquery_errors_propagate() {
    let err = select("users").where_exists(select("")).render().unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_searched_case_in_projection() {
    let case = CaseExpr::searched()
        .when_cmp("age", Op::Lt, 18)
        .then("Minor")
        .unwrap()
        .when_cmp("age", Op::Lt, 65)
        .then("Adult")
        .unwrap()
        .otherwise("Senior")
        .alias("age_group");
    let frag = select("users")
        .select("name")
        .select_expr(case)
        .where_eq("active", true)
        .render()
        .unwrap();
    assert_eq!(
        frag.sql,
        "SELECT name, CASE WHEN age < ? THEN ? WHEN age < ? THEN ? ELSE ? END AS age_group FROM users WHERE active = ?"
    );
    assert_eq!(
        frag.bindings,
        vec![
            Value::from(18),
            Value::from("Minor"),
            Value::from(65),
            Value::from("Adult"),
            Value::from("Senior"),
            Value::from(true),
        ]
    );
}

#[test]
fn test_invalid_case_fails_select_render() {
    let frag = select("users").select_expr(CaseExpr::searched()).render();
    assert!(frag.unwrap_err().is_validation());
}

#[test]
fn test_update_and_delete_without_where() {
    assert_eq!(
        update("users")
            .set(Record::new().with("active", false))
            .to_sql()
            .unwrap(),
        "UPDATE users SET active = ?"
    );
    assert_eq!(delete("users").to_sql().unwrap(), "DELETE FROM users");
}

#[test]
fn test_or_conditions() {
    let frag = select("users")
        .where_eq("role", "admin")
        .or_where_op("karma", ">=", 1000)
        .unwrap()
        .or_where_in("id", [1, 2, 3])
        .unwrap()
        .render()
        .unwrap();
    assert_eq!(
        frag.sql,
        "SELECT * FROM users WHERE role = ? OR karma >= ? OR id IN (?, ?, ?)"
    );
    assert_eq!(frag.bindings.len(), 5);
}

#[test]
fn test_binding_count_matches_placeholders() {
    let subquery = select("orders")
        .select("user_id")
        .where_between("created_at", "2024-01-01", "2024-12-31");
    let case = CaseExpr::simple("tier")
        .when("gold")
        .then(3)
        .unwrap()
        .when("silver")
        .then(2)
        .unwrap()
        .otherwise(1)
        .alias("rank");

    let fragments = vec![
        select("users").render().unwrap(),
        select("users")
            .distinct()
            .select("u.id")
            .select_expr(case)
            .count("*")
            .join("orders o", "o.user_id", "=", "u.id")
            .unwrap()
            .where_in("u.status", ["a", "b"])
            .unwrap()
            .where_not_in("u.role", ["x"])
            .unwrap()
            .where_null("u.deleted_at")
            .where_raw("u.score > ? AND u.note <> '?'", [Value::from(10)])
            .where_in_subquery("u.id", subquery.clone())
            .where_not_exists(subquery.clone())
            .group_by(&["u.id", "tier"])
            .having_op("COUNT(*)", ">", 2)
            .unwrap()
            .having_raw("SUM(o.total) < ?", [Value::from(500)])
            .order_by_desc("u.id")
            .page(3, 20)
            .unwrap()
            .union_all(select("guests").where_eq("kind", "vip"))
            .render()
            .unwrap(),
        insert("t")
            .values(Record::new().with("a", 1).with("b", Value::Null))
            .values(Record::new().with("a", 2).with("b", "x"))
            .returning("id")
            .render()
            .unwrap(),
        update("t")
            .set(Record::new().with("a", 1).with("b", 2))
            .where_record(Record::new().with("c", 3).with("d", 4))
            .where_between("e", 1, 9)
            .render()
            .unwrap(),
        delete("t").where_exists(subquery).or_where_null("x").render().unwrap(),
    ];

    for frag in &fragments {
        assert_aligned(frag);
    }
}

#[test]
fn test_render_is_pure() {
    let qb = update("users")
        .set(Record::new().with("name", "x"))
        .where_in("id", [1, 2])
        .unwrap();
    let first = qb.render().unwrap();
    let second = qb.render().unwrap();
    assert_eq!(first, second);
}

mod fetch {
    use super::*;
    use crate::error::{SqlError, SqlResult};
    use crate::executor::Executor;
    use crate::qb::MutationQb;
    use crate::record::FromRecord;
    use crate::testing::{Call, MockExecutor};

    #[derive(Debug, PartialEq)]
    struct Name(String);

    impl FromRecord for Name {
        fn from_record(record: &Record) -> SqlResult<Self> {
            Ok(Name(record.try_get("name")?))
        }
    }

    #[tokio::test]
    async fn fetch_passes_rendered_pair() {
        let exec = MockExecutor::with_rows(vec![Record::new().with("name", "B")]);
        let names: Vec<Name> = select("users")
            .select("name")
            .where_op("age", ">=", 18)
            .unwrap()
            .fetch_all_as(&exec)
            .await
            .unwrap();
        assert_eq!(names, vec![Name("B".into())]);
        assert_eq!(
            exec.calls(),
            vec![Call::Query(
                "SELECT name FROM users WHERE age >= ?".into(),
                vec![Value::from(18)]
            )]
        );
        assert_eq!(exec.affected_rows(), 1);
    }

    #[tokio::test]
    async fn fetch_one_without_rows_is_not_found() {
        let exec = MockExecutor::new();
        let err = select("users").where_eq("id", 1).fetch_one(&exec).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(select("users").fetch_opt(&exec).await.unwrap().is_none());
        assert!(exec.query_one("SELECT 1", &[]).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn invalid_builder_never_reaches_executor() {
        let exec = MockExecutor::new();
        let err = update("users").where_eq("id", 1).execute(&exec).await.unwrap_err();
        assert!(matches!(err, SqlError::Validation(_)));
        assert!(exec.calls().is_empty());
    }

    #[tokio::test]
    async fn executor_errors_pass_through() {
        let exec = MockExecutor {
            fail_statements: true,
            ..MockExecutor::default()
        };
        let err = delete("users").execute(&exec).await.unwrap_err();
        assert!(err.is_executor());
        assert_eq!(err.to_string(), "Executor error: backend failure");
    }
}
