//! Spec and config loading from YAML files

use std::io::Write;
use std::path::PathBuf;

use adjacency_cte::{
    config::CompilerConfig,
    hierarchy_catalog::{
        ColumnType, Direction, Edges, HierarchySpec, HierarchySpecError, SegmentKind,
    },
    recursive_query::{CompileError, RecursiveQueryBuilder},
    sql_grammar::Driver,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn yaml_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_categories_fixture() {
    let spec = HierarchySpec::from_yaml_file(fixture("categories.yaml")).unwrap();
    assert_eq!(spec.table, "categories");
    assert!(matches!(
        &spec.edges,
        Edges::AdjacencyList { parent_key } if parent_key == "parent_id"
    ));
    assert_eq!(spec.custom_paths.len(), 1);
    assert_eq!(spec.segment_kind("id"), SegmentKind::Integer);
    assert_eq!(
        spec.generated_columns(),
        vec!["depth".to_string(), "path".to_string(), "slug_path".to_string()]
    );
}

#[test]
fn test_graph_fixture() {
    let spec = HierarchySpec::from_yaml_file(fixture("graph.yaml")).unwrap();
    assert!(spec.is_graph());
    assert_eq!(spec.direction, Direction::Descending);
    assert!(spec.cycle_detection.include_start);
    assert_eq!(
        spec.pivot_columns()[0].column_type,
        Some(ColumnType::Integer)
    );
}

#[test]
fn test_compiler_config_fixture() {
    let config = CompilerConfig::from_yaml_file(fixture("compiler.yaml")).unwrap();
    assert_eq!(config.driver().unwrap(), Driver::Sqlite);
    assert!(config.natural_ordering);

    let spec = HierarchySpec::from_yaml_file(fixture("categories.yaml")).unwrap();
    assert_eq!(config.apply(spec).max_depth, Some(10));
}

#[test]
fn test_missing_file() {
    let err = HierarchySpec::from_yaml_file(fixture("missing.yaml")).unwrap_err();
    assert!(matches!(err, HierarchySpecError::ConfigRead { .. }));
}

#[test]
fn test_unparseable_yaml() {
    let file = yaml_file("table: [categories\n");
    let err = HierarchySpec::from_yaml_file(file.path()).unwrap_err();
    assert!(matches!(err, HierarchySpecError::ConfigParse { .. }));
}

#[test]
fn test_unknown_direction_is_a_parse_error() {
    let file = yaml_file(
        "table: categories\nedges:\n  kind: adjacency_list\n  parent_key: parent_id\ndirection: sideways\n",
    );
    assert!(HierarchySpec::from_yaml_file(file.path()).is_err());
}

#[test]
fn test_loading_validates_the_spec() {
    let file = yaml_file(
        "table: categories\nedges:\n  kind: adjacency_list\n  parent_key: parent_id\nexpression_name: \"bad name\"\n",
    );
    let err = HierarchySpec::from_yaml_file(file.path()).unwrap_err();
    assert!(matches!(err, HierarchySpecError::Validation(_)));

    let file = yaml_file("table: categories\nedges:\n  kind: adjacency_list\n  parent_key: \"\"\n");
    let err = HierarchySpec::from_yaml_file(file.path()).unwrap_err();
    assert!(matches!(err, HierarchySpecError::MissingKeyColumn { .. }));
}

#[test]
fn test_builder_validates_hand_built_specs() {
    let spec = HierarchySpec::adjacency_list("categories", "id", "parent_id")
        .with_direction(Direction::Bidirectional)
        .with_initial_depth(1);
    let err = RecursiveQueryBuilder::for_driver(spec, Driver::MySql).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Spec(HierarchySpecError::InvalidInitialDepth { .. })
    ));
}
