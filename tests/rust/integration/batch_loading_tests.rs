//! Batched descendant loading fanned back out with the path dictionary

use std::collections::BTreeSet;

use adjacency_cte::{
    recursive_query::{RecursiveQueryBuilder, RelatedTable, RelationKind},
    render_plan::Binding,
    sql_grammar::Driver,
};
use serde_json::json;

use super::sqlite_support::{categories_db, fetch, fixture_spec, ids};

fn categories() -> RecursiveQueryBuilder {
    RecursiveQueryBuilder::for_driver(fixture_spec("categories.yaml"), Driver::Sqlite).unwrap()
}

#[test]
fn test_dictionary_matches_one_query_per_key() {
    let conn = categories_db();
    let builder = categories();
    let keys: Vec<Binding> = vec![json!(1), json!(2), json!(5), json!(4)];

    let batch = builder
        .compile_batch(RelationKind::Descendants, &keys, None)
        .unwrap();
    let rows = fetch(&conn, &batch.to_statement());
    let mut dictionary = builder
        .path_matcher(RelationKind::Descendants, None)
        .build_dictionary(rows)
        .unwrap();

    for key in &keys {
        let single = builder
            .compile_relation(RelationKind::Descendants, std::slice::from_ref(key))
            .unwrap();
        let expected = ids(&fetch(&conn, &single.to_statement()));
        let bucket = dictionary.take(&key.to_string());
        assert_eq!(ids(&bucket), expected, "key {key}");
    }
}

#[test]
fn test_rows_appear_once_per_key() {
    let conn = categories_db();
    let builder = categories();
    let batch = builder
        .compile_batch(RelationKind::DescendantsAndSelf, &[json!(1), json!(2)], None)
        .unwrap();
    let rows = fetch(&conn, &batch.to_statement());
    // each category comes back once even when two keys reach it
    assert_eq!(rows.len(), 7);

    let dictionary = builder
        .path_matcher(RelationKind::DescendantsAndSelf, None)
        .build_dictionary(rows)
        .unwrap();
    let books = dictionary.get("2").unwrap();
    assert_eq!(books.len(), 3);
    assert_eq!(ids(books), BTreeSet::from([2, 3, 4]));
    assert!(books.iter().all(|row| !row.contains_column("adjacency_paths")));
}

#[test]
fn test_related_rows() {
    let conn = categories_db();
    let builder = categories();
    let related = RelatedTable::new("posts", "category_id");

    let batch = builder
        .compile_batch(RelationKind::Descendants, &[json!(1), json!(5)], Some(&related))
        .unwrap();
    let rows = fetch(&conn, &batch.to_statement());
    // post 102 sits on category 1 itself
    assert_eq!(ids(&rows), BTreeSet::from([100, 101]));

    let mut dictionary = builder
        .path_matcher(RelationKind::Descendants, Some(&related))
        .build_dictionary(rows)
        .unwrap();
    assert_eq!(ids(&dictionary.take("1")), BTreeSet::from([100]));
    assert_eq!(ids(&dictionary.take("5")), BTreeSet::from([101]));
    assert!(dictionary.take("3").is_empty());
}
