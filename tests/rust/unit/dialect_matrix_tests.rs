//! Per-backend expectations for the recursive expression fragments.

use adjacency_cte::{
    hierarchy_catalog::{ColumnType, HierarchySpec, SegmentKind},
    recursive_query::{CompileError, RecursiveQueryBuilder, RelationKind, RootConstraint},
    render_plan::ToSql,
    sql_grammar::{grammar_for, Driver},
};
use serde_json::json;
use test_case::test_case;

fn categories() -> HierarchySpec {
    HierarchySpec::adjacency_list("categories", "id", "parent_id")
        .with_column_type("id", ColumnType::Integer)
}

#[test_case(Driver::MySql, "WITH RECURSIVE `adjacency_cte` AS (" ; "mysql")]
#[test_case(Driver::MariaDb, "WITH RECURSIVE `adjacency_cte` AS (" ; "mariadb")]
#[test_case(Driver::SingleStore, "WITH RECURSIVE `adjacency_cte` AS (" ; "singlestore")]
#[test_case(Driver::Postgres, "WITH RECURSIVE \"adjacency_cte\" AS (" ; "postgres")]
#[test_case(Driver::Sqlite, "WITH RECURSIVE \"adjacency_cte\" AS (" ; "sqlite")]
#[test_case(Driver::SqlServer, "WITH [adjacency_cte] AS (" ; "sql server")]
#[test_case(Driver::Firebird, "WITH RECURSIVE \"adjacency_cte\" AS (" ; "firebird")]
fn test_expression_header(driver: Driver, header: &str) {
    let builder = RecursiveQueryBuilder::for_driver(categories(), driver).unwrap();
    let sql = builder.compile(&RootConstraint::IsRoot).unwrap().to_sql();
    assert!(sql.starts_with(header), "{sql}");
}

#[test_case(Driver::MySql, "CAST(`categories`.`id` AS CHAR(65535)) AS `path`" ; "mysql")]
#[test_case(Driver::MariaDb, "CAST(`categories`.`id` AS CHAR(65535)) AS `path`" ; "mariadb")]
#[test_case(Driver::SingleStore, "CAST(`categories`.`id` AS CHAR) AS `path`" ; "singlestore")]
#[test_case(Driver::Postgres, "ARRAY[\"categories\".\"id\"] AS \"path\"" ; "postgres")]
#[test_case(Driver::Sqlite, "CAST(\"categories\".\"id\" AS TEXT) AS \"path\"" ; "sqlite")]
#[test_case(Driver::SqlServer, "CAST([categories].[id] AS VARCHAR(MAX)) AS [path]" ; "sql server")]
#[test_case(Driver::Firebird, "CAST(\"categories\".\"id\" AS VARCHAR(8191)) AS \"path\"" ; "firebird")]
fn test_initial_path(driver: Driver, expected: &str) {
    let grammar = grammar_for(driver);
    assert_eq!(
        grammar.compile_initial_path("categories.id", "path", SegmentKind::Integer),
        expected
    );
}

#[test_case(Driver::MySql, 1 ; "mysql")]
#[test_case(Driver::MariaDb, 1 ; "mariadb")]
#[test_case(Driver::SingleStore, 1 ; "singlestore")]
#[test_case(Driver::Postgres, 0 ; "postgres")]
#[test_case(Driver::Sqlite, 1 ; "sqlite")]
#[test_case(Driver::SqlServer, 1 ; "sql server")]
#[test_case(Driver::Firebird, 1 ; "firebird")]
fn test_placeholders_match_bindings(driver: Driver, step_bindings: usize) {
    let spec = categories().with_cycle_detection(true).with_max_depth(4);
    let builder = RecursiveQueryBuilder::for_driver(spec, driver).unwrap();
    let statement = builder
        .compile_relation(RelationKind::Descendants, &[json!(1), json!(2)])
        .unwrap()
        .to_statement();

    let placeholders = statement.sql.matches('?').count();
    assert_eq!(placeholders, statement.bindings.len(), "{}", statement.sql);
    // two keys, the path step, and the cycle flag where the backend binds separators
    let cycle_bindings = builder.grammar().cycle_detection_bindings(".").len();
    assert_eq!(placeholders, 2 + step_bindings + cycle_bindings);
}

#[test_case(Driver::MySql, "NOT `adjacency_cte`.`is_cycle`" ; "mysql")]
#[test_case(Driver::Postgres, "NOT \"adjacency_cte\".\"is_cycle\"" ; "postgres")]
#[test_case(Driver::SqlServer, "[adjacency_cte].[is_cycle] = 0" ; "sql server")]
fn test_cycle_stop_constraint(driver: Driver, expected: &str) {
    let spec = HierarchySpec::edge_table("nodes", "id", "edges", "parent_id", "child_id")
        .with_cycle_detection(true);
    let builder = RecursiveQueryBuilder::for_driver(spec, driver).unwrap();
    let expression = builder.compile_expression(&RootConstraint::All).unwrap();
    assert!(expression.step.to_sql().ends_with(expected));
}

#[test_case(Driver::MySql, "'$1$2'" ; "mysql uses dollar groups")]
#[test_case(Driver::MariaDb, "'\\\\1\\\\2'" ; "mariadb uses backslash groups")]
#[test_case(Driver::SingleStore, "'\\\\1\\\\2'" ; "singlestore uses backslash groups")]
fn test_natural_ordering(driver: Driver, strip: &str) {
    let builder = RecursiveQueryBuilder::for_driver(categories(), driver).unwrap();
    let order = builder.order_by_path_expression();
    assert!(order.starts_with("REGEXP_REPLACE(REGEXP_REPLACE(`adjacency_cte`.`path`"));
    assert!(order.contains(strip), "{order}");
    assert!(order.ends_with(" ASC"));
}

#[test_case(Driver::Postgres ; "postgres")]
#[test_case(Driver::Sqlite ; "sqlite")]
#[test_case(Driver::SqlServer ; "sql server")]
#[test_case(Driver::Firebird ; "firebird")]
fn test_path_ordering_without_regex(driver: Driver) {
    let builder = RecursiveQueryBuilder::for_driver(categories(), driver).unwrap();
    let order = builder.order_by_path_expression();
    assert!(!order.contains("REGEXP_REPLACE"));
    assert!(order.ends_with(" ASC"));
}

#[test_case(Driver::MySql, true ; "mysql")]
#[test_case(Driver::MariaDb, false ; "mariadb")]
#[test_case(Driver::SingleStore, true ; "singlestore")]
#[test_case(Driver::Postgres, true ; "postgres")]
#[test_case(Driver::Sqlite, true ; "sqlite")]
#[test_case(Driver::SqlServer, true ; "sql server")]
#[test_case(Driver::Firebird, false ; "firebird")]
fn test_write_placement(driver: Driver, expression_first: bool) {
    use adjacency_cte::recursive_query::WriteOperation;

    let builder = RecursiveQueryBuilder::for_driver(categories(), driver).unwrap();
    let statement = builder
        .compile_write(&RootConstraint::keys([1]), &WriteOperation::Delete)
        .unwrap();
    assert_eq!(statement.sql.starts_with("WITH"), expression_first);
    assert_eq!(statement.sql.matches('?').count(), statement.bindings.len());
}

#[test]
fn test_existence_is_rejected_where_expressions_cannot_nest() {
    for driver in Driver::all() {
        let builder = RecursiveQueryBuilder::for_driver(categories(), driver).unwrap();
        let result = builder.compile_existence("categories", None);
        if builder.grammar().supports_nested_recursive_expression() {
            assert!(result.is_ok(), "{driver}");
        } else {
            assert!(matches!(result, Err(CompileError::UnsupportedFeature { .. })));
        }
    }
}
