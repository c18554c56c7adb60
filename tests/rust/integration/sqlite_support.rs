//! Shared SQLite fixtures
//!
//! ```text
//! categories                      nodes / edges
//!   1 root                          12 -> 13 -> 14 -> 12
//!   ├── 2 books
//!   │   └── 3 fiction
//!   │       └── 4 fantasy
//!   ├── 9 music
//!   ├── 10 games
//!   └── 11 film
//!   5 archive
//!   └── 6 old
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use adjacency_cte::{
    hierarchy_catalog::HierarchySpec,
    path_matcher::ResultRow,
    render_plan::{Binding, Statement},
};
use rusqlite::{params_from_iter, types::ValueRef, Connection};
use serde_json::{json, Value};

pub fn fixture_spec(name: &str) -> HierarchySpec {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    HierarchySpec::from_yaml_file(path).unwrap()
}

pub fn categories_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE categories (
             id INTEGER PRIMARY KEY,
             parent_id INTEGER NULL,
             slug TEXT NOT NULL,
             views INTEGER NOT NULL DEFAULT 0
         );
         INSERT INTO categories (id, parent_id, slug) VALUES
             (1, NULL, 'root'),
             (2, 1, 'books'),
             (3, 2, 'fiction'),
             (4, 3, 'fantasy'),
             (9, 1, 'music'),
             (10, 1, 'games'),
             (11, 1, 'film'),
             (5, NULL, 'archive'),
             (6, 5, 'old');
         CREATE TABLE posts (
             id INTEGER PRIMARY KEY,
             category_id INTEGER NOT NULL,
             title TEXT NOT NULL
         );
         INSERT INTO posts (id, category_id, title) VALUES
             (100, 3, 'dragons'),
             (101, 6, 'minutes'),
             (102, 1, 'welcome');",
    )
    .unwrap();
    conn
}

pub fn graph_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE nodes (id INTEGER PRIMARY KEY, label TEXT NOT NULL);
         INSERT INTO nodes (id, label) VALUES (12, 'a'), (13, 'b'), (14, 'c');
         CREATE TABLE edges (
             parent_id INTEGER NOT NULL,
             child_id INTEGER NOT NULL,
             weight INTEGER NOT NULL
         );
         INSERT INTO edges (parent_id, child_id, weight) VALUES
             (12, 13, 1),
             (13, 14, 2),
             (14, 12, 3);",
    )
    .unwrap();
    conn
}

fn to_sqlite(value: &Binding) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Null => Sql::Null,
        Value::Bool(flag) => Sql::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Sql::Integer(integer),
            None => Sql::Real(number.as_f64().unwrap()),
        },
        Value::String(text) => Sql::Text(text.clone()),
        other => Sql::Text(other.to_string()),
    }
}

pub fn fetch(conn: &Connection, statement: &Statement) -> Vec<ResultRow> {
    let mut prepared = conn
        .prepare(&statement.sql)
        .unwrap_or_else(|e| panic!("{e}\n{}", statement.sql));
    let columns: Vec<String> = prepared
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = prepared
        .query(params_from_iter(statement.bindings.iter().map(to_sqlite)))
        .unwrap();
    let mut out = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let mut result = ResultRow::new();
        for (index, column) in columns.iter().enumerate() {
            let value = match row.get_ref(index).unwrap() {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(integer) => json!(integer),
                ValueRef::Real(real) => json!(real),
                ValueRef::Text(text) => json!(String::from_utf8_lossy(text)),
                ValueRef::Blob(blob) => json!(blob),
            };
            result.insert(column.clone(), value);
        }
        out.push(result);
    }
    out
}

pub fn execute(conn: &Connection, statement: &Statement) -> usize {
    conn.execute(
        &statement.sql,
        params_from_iter(statement.bindings.iter().map(to_sqlite)),
    )
    .unwrap_or_else(|e| panic!("{e}\n{}", statement.sql))
}

pub fn int(row: &ResultRow, column: &str) -> i64 {
    row.get(column)
        .and_then(Value::as_i64)
        .unwrap_or_else(|| panic!("no integer '{column}' in {row:?}"))
}

pub fn text<'a>(row: &'a ResultRow, column: &str) -> &'a str {
    row.get(column)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("no text '{column}' in {row:?}"))
}

pub fn ids(rows: &[ResultRow]) -> BTreeSet<i64> {
    rows.iter().map(|row| int(row, "id")).collect()
}
