//! UPDATE / DELETE statements over every reached row

use std::collections::HashMap;

use adjacency_cte::{
    recursive_query::{RecursiveQueryBuilder, RootConstraint, WriteOperation},
    render_plan::Statement,
    sql_grammar::Driver,
};
use serde_json::json;

use super::sqlite_support::{categories_db, execute, fetch, fixture_spec, int, text};

fn categories() -> RecursiveQueryBuilder {
    RecursiveQueryBuilder::for_driver(fixture_spec("categories.yaml"), Driver::Sqlite).unwrap()
}

fn all_rows(conn: &rusqlite::Connection) -> Vec<adjacency_cte::path_matcher::ResultRow> {
    fetch(
        conn,
        &Statement {
            sql: "SELECT * FROM categories ORDER BY id".to_string(),
            bindings: vec![],
        },
    )
}

#[test]
fn test_increment_subtree() {
    let conn = categories_db();
    let statement = categories()
        .compile_write(
            &RootConstraint::keys([2]),
            &WriteOperation::Increment {
                column: "views".to_string(),
                amount: json!(5),
            },
        )
        .unwrap();
    assert_eq!(execute(&conn, &statement), 3);

    let views: HashMap<i64, i64> = all_rows(&conn)
        .iter()
        .map(|r| (int(r, "id"), int(r, "views")))
        .collect();
    assert_eq!(views[&2], 5);
    assert_eq!(views[&3], 5);
    assert_eq!(views[&4], 5);
    assert_eq!(views[&1], 0);
    assert_eq!(views[&9], 0);
}

#[test]
fn test_decrement_and_update() {
    let conn = categories_db();
    let builder = categories();

    let decrement = builder
        .compile_write(
            &RootConstraint::keys([5]),
            &WriteOperation::Decrement {
                column: "views".to_string(),
                amount: json!(2),
            },
        )
        .unwrap();
    assert_eq!(execute(&conn, &decrement), 2);

    let update = builder
        .compile_write(
            &RootConstraint::keys([3]),
            &WriteOperation::Update(vec![("slug".to_string(), json!("archived"))]),
        )
        .unwrap();
    assert_eq!(execute(&conn, &update), 2);

    let rows = all_rows(&conn);
    let by_id: HashMap<i64, _> = rows.iter().map(|r| (int(r, "id"), r)).collect();
    assert_eq!(int(by_id[&6], "views"), -2);
    assert_eq!(text(by_id[&3], "slug"), "archived");
    assert_eq!(text(by_id[&4], "slug"), "archived");
    assert_eq!(text(by_id[&2], "slug"), "books");
}

#[test]
fn test_delete_subtree() {
    let conn = categories_db();
    let statement = categories()
        .compile_write(&RootConstraint::keys([5]), &WriteOperation::Delete)
        .unwrap();
    assert_eq!(execute(&conn, &statement), 2);

    let remaining: Vec<i64> = all_rows(&conn).iter().map(|r| int(r, "id")).collect();
    assert_eq!(remaining, vec![1, 2, 3, 4, 9, 10, 11]);
}
