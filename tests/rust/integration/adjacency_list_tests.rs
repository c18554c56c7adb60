//! Relations over the `categories` adjacency list

use std::collections::{BTreeSet, HashMap};

use adjacency_cte::{
    hierarchy_catalog::{Direction, HierarchySpec},
    path_matcher::sort_rows_naturally,
    recursive_query::{RecursiveQueryBuilder, RelationKind, RootConstraint},
    render_plan::{SqlFragment, Statement, ToSql},
    sql_grammar::Driver,
};
use serde_json::json;

use super::sqlite_support::{categories_db, fetch, fixture_spec, ids, int, text};

fn builder(spec: HierarchySpec) -> RecursiveQueryBuilder {
    RecursiveQueryBuilder::for_driver(spec, Driver::Sqlite).unwrap()
}

fn categories() -> RecursiveQueryBuilder {
    builder(fixture_spec("categories.yaml"))
}

#[test]
fn test_descendants() {
    let conn = categories_db();
    let query = categories()
        .compile_relation(RelationKind::Descendants, &[json!(1)])
        .unwrap();
    let rows = fetch(&conn, &query.to_statement());

    assert_eq!(ids(&rows), BTreeSet::from([2, 3, 4, 9, 10, 11]));
    let depths: HashMap<i64, i64> = rows.iter().map(|r| (int(r, "id"), int(r, "depth"))).collect();
    assert_eq!(depths[&2], 1);
    assert_eq!(depths[&3], 2);
    assert_eq!(depths[&4], 3);
    assert_eq!(depths[&11], 1);
}

#[test]
fn test_depth_and_path_invariants() {
    let conn = categories_db();
    let query = categories()
        .compile_relation(RelationKind::DescendantsAndSelf, &[json!(1), json!(5)])
        .unwrap();
    let rows = fetch(&conn, &query.to_statement());
    let paths: HashMap<i64, String> = rows
        .iter()
        .map(|r| (int(r, "id"), text(r, "path").to_string()))
        .collect();

    for row in &rows {
        let id = int(row, "id");
        let path = text(row, "path");
        let segments: Vec<&str> = path.split('.').collect();

        // one segment per level below the anchor row
        assert_eq!(int(row, "depth"), segments.len() as i64 - 1, "{path}");
        assert_eq!(segments.last(), Some(&id.to_string().as_str()));
        assert!(["1", "5"].contains(&segments[0]), "{path}");

        if let Some(parent) = row.get("parent_id").and_then(|v| v.as_i64()) {
            if int(row, "depth") > 0 {
                assert_eq!(path, format!("{}.{}", paths[&parent], id));
            }
        }
    }
}

#[test]
fn test_custom_slug_path() {
    let conn = categories_db();
    let query = categories()
        .compile_relation(RelationKind::Descendants, &[json!(1)])
        .unwrap();
    let rows = fetch(&conn, &query.to_statement());
    let fantasy = rows.iter().find(|r| int(r, "id") == 4).unwrap();
    assert_eq!(text(fantasy, "slug_path"), "root/books/fiction/fantasy");
}

#[test]
fn test_ancestors() {
    let conn = categories_db();
    let query = categories()
        .compile_relation(RelationKind::Ancestors, &[json!(4)])
        .unwrap();
    let rows = fetch(&conn, &query.to_statement());

    assert_eq!(ids(&rows), BTreeSet::from([1, 2, 3]));
    let root = rows.iter().find(|r| int(r, "id") == 1).unwrap();
    assert_eq!(int(root, "depth"), -3);
    assert_eq!(text(root, "path"), "4.3.2.1");
}

#[test]
fn test_bloodline_skips_siblings() {
    let conn = categories_db();
    let query = categories()
        .compile_relation(RelationKind::Bloodline, &[json!(3)])
        .unwrap();
    let rows = fetch(&conn, &query.to_statement());

    assert_eq!(ids(&rows), BTreeSet::from([1, 2, 3, 4]));
    let depths: HashMap<i64, i64> = rows.iter().map(|r| (int(r, "id"), int(r, "depth"))).collect();
    assert_eq!(depths[&1], -2);
    assert_eq!(depths[&2], -1);
    assert_eq!(depths[&3], 0);
    assert_eq!(depths[&4], 1);
}

#[test]
fn test_tree_starts_at_every_root() {
    let conn = categories_db();
    let query = categories().compile_relation(RelationKind::Tree, &[]).unwrap();
    let rows = fetch(&conn, &query.to_statement());

    assert_eq!(rows.len(), 9);
    let roots: BTreeSet<i64> = rows
        .iter()
        .filter(|r| int(r, "depth") == 0)
        .map(|r| int(r, "id"))
        .collect();
    assert_eq!(roots, BTreeSet::from([1, 5]));
}

#[test]
fn test_max_depth_two() {
    let conn = categories_db();
    let spec = fixture_spec("categories.yaml").with_max_depth(2);
    let query = builder(spec)
        .compile_relation(RelationKind::DescendantsAndSelf, &[json!(1)])
        .unwrap();
    let rows = fetch(&conn, &query.to_statement());

    assert_eq!(ids(&rows), BTreeSet::from([1, 2, 9, 10, 11]));
    assert!(rows.iter().all(|r| int(r, "depth") < 2));
}

#[test]
fn test_children_as_anchor_rows() {
    let conn = categories_db();
    let spec = fixture_spec("categories.yaml").with_initial_depth(1);
    let query = builder(spec)
        .compile(&RootConstraint::adjacent_to([1]))
        .unwrap();
    let rows = fetch(&conn, &query.to_statement());

    assert_eq!(ids(&rows), BTreeSet::from([2, 3, 4, 9, 10, 11]));
    let fiction = rows.iter().find(|r| int(r, "id") == 3).unwrap();
    assert_eq!(int(fiction, "depth"), 2);
    assert_eq!(text(fiction, "path"), "2.3");
}

#[test]
fn test_parents_as_anchor_rows() {
    let conn = categories_db();
    let spec = HierarchySpec::adjacency_list("categories", "id", "parent_id")
        .with_direction(Direction::Ascending)
        .with_initial_depth(-1);
    let query = builder(spec)
        .compile(&RootConstraint::adjacent_to([4]))
        .unwrap();
    let rows = fetch(&conn, &query.to_statement());

    assert_eq!(ids(&rows), BTreeSet::from([1, 2, 3]));
    assert!(rows.iter().all(|r| int(r, "depth") < 0));
}

#[test]
fn test_natural_path_order() {
    let conn = categories_db();
    let builder = categories();
    let mut query = builder
        .compile_relation(RelationKind::DescendantsAndSelf, &[json!(1)])
        .unwrap();
    query.add_order_by(builder.order_by_path_expression());
    let mut rows = fetch(&conn, &query.to_statement());

    // SQLite has no REGEXP_REPLACE, so the backend order is lexicographic
    let fetched: Vec<i64> = rows.iter().map(|r| int(r, "id")).collect();
    assert_eq!(fetched, vec![1, 10, 11, 2, 3, 4, 9]);

    sort_rows_naturally(&mut rows, "path", ".").unwrap();
    let sorted: Vec<i64> = rows.iter().map(|r| int(r, "id")).collect();
    assert_eq!(sorted, vec![1, 2, 3, 4, 9, 10, 11]);
}

#[test]
fn test_existence_of_descendants() {
    let conn = categories_db();
    let existence = categories().compile_existence("categories", None).unwrap();
    let exists = existence.exists();

    let statement = Statement {
        sql: format!(
            "SELECT \"categories\".\"id\" FROM \"categories\" WHERE {}",
            exists.sql
        ),
        bindings: exists.bindings,
    };
    let rows = fetch(&conn, &statement);
    assert_eq!(ids(&rows), BTreeSet::from([1, 2, 3, 5]));
}

#[test]
fn test_existence_compiled_twice_in_one_statement() {
    let conn = categories_db();
    let builder = categories();
    let first_existence = builder.compile_existence("categories", None).unwrap();
    let second_existence = builder.compile_existence("categories", None).unwrap();
    assert_ne!(first_existence.table_hash, second_existence.table_hash);

    let first = first_existence.exists();
    let second = second_existence.exists();
    let single = fetch(
        &conn,
        &Statement {
            sql: format!(
                "SELECT \"categories\".\"id\" FROM \"categories\" WHERE {}",
                first.sql
            ),
            bindings: first.bindings.clone(),
        },
    );
    let both = fetch(
        &conn,
        &Statement {
            sql: format!(
                "SELECT \"categories\".\"id\" FROM \"categories\" WHERE {} AND {}",
                first.sql, second.sql
            ),
            bindings: first.bindings.into_iter().chain(second.bindings).collect(),
        },
    );
    assert_eq!(ids(&single), BTreeSet::from([1, 2, 3, 5]));
    assert_eq!(ids(&both), ids(&single));
}

#[test]
fn test_existence_aggregate() {
    let conn = categories_db();
    let existence = categories()
        .compile_existence("categories", Some("MAX(\"categories\".\"depth\")"))
        .unwrap();
    let height: SqlFragment = existence.scalar();

    let statement = Statement {
        sql: format!(
            "SELECT \"categories\".\"id\", {} AS \"height\" FROM \"categories\" \
             WHERE \"categories\".\"parent_id\" IS NULL",
            height.sql
        ),
        bindings: height.bindings,
    };
    let rows = fetch(&conn, &statement);
    let heights: HashMap<i64, i64> = rows.iter().map(|r| (int(r, "id"), int(r, "height"))).collect();
    assert_eq!(heights[&1], 3);
    assert_eq!(heights[&5], 1);
    assert!(!existence.query.select.to_sql().contains(&existence.table_hash));
}
