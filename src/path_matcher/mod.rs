//! Fans batched descendant rows back out to the keys that requested them.
//!
//! A batch query returns every reached row once, with all of its paths joined by the
//! list separator in [`PATH_LIST_COLUMN`]. A row belongs to every key that occurs in one
//! of its paths before the row's own key:
//!
//! ```text
//! row 5, adjacency_paths = "1.3.5..2.5"
//!   -> buckets 1, 3 and 2 (and 5 itself for "and self" relations)
//! ```

pub mod errors;

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::hierarchy_catalog::HierarchySpec;
use crate::recursive_query::{RecursiveQueryBuilder, RelatedTable, RelationKind, PATH_LIST_COLUMN};
use crate::sql_grammar::errors::GrammarError;
use crate::sql_grammar::natural_order::NaturalSortKey;

pub use errors::MatchError;

/// One fetched row, columns in select order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow(pub Map<String, Value>);

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(column.into(), value)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.shift_remove(column)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ResultRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Key segment -> rows, each row at most once per key and in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    buckets: HashMap<String, Vec<ResultRow>>,
}

impl Dictionary {
    pub fn get(&self, key: &str) -> Option<&[ResultRow]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Hands the bucket over to its requesting record. Keys nobody reached return an
    /// empty list.
    pub fn take(&mut self, key: &str) -> Vec<ResultRow> {
        self.buckets.remove(key).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatcher {
    /// Column whose value is the row's last path segment: the hierarchy key, or the
    /// foreign key of a related table
    pub key_column: String,
    pub path_list_column: String,
    pub path_separator: String,
    pub list_separator: String,
    pub and_self: bool,
}

impl PathMatcher {
    pub fn new(spec: &HierarchySpec, list_separator: &str, and_self: bool) -> Self {
        Self {
            key_column: spec.local_key.clone(),
            path_list_column: PATH_LIST_COLUMN.to_string(),
            path_separator: spec.path_separator.clone(),
            list_separator: list_separator.to_string(),
            and_self,
        }
    }

    pub fn with_key_column(mut self, column: &str) -> Self {
        self.key_column = column.to_string();
        self
    }

    pub fn build_dictionary(&self, rows: Vec<ResultRow>) -> Result<Dictionary, MatchError> {
        let mut members: HashMap<String, Vec<usize>> = HashMap::new();
        let mut rows = rows;

        for (index, row) in rows.iter_mut().enumerate() {
            let key = key_segment(row, &self.key_column)?;
            let path_list = row.remove(&self.path_list_column);
            let Some(Value::String(path_list)) = path_list else {
                continue;
            };

            for path in path_list.split(self.list_separator.as_str()) {
                if !self.ends_with_key(path, &key) {
                    continue;
                }
                let mut segments: Vec<&str> = path.split(self.path_separator.as_str()).collect();
                if !self.and_self {
                    segments.pop();
                }
                for segment in segments {
                    let bucket = members.entry(segment.to_string()).or_default();
                    if !bucket.contains(&index) {
                        bucket.push(index);
                    }
                }
            }
        }

        let buckets = members
            .into_iter()
            .map(|(segment, indexes)| {
                let bucket = indexes.into_iter().map(|i| rows[i].clone()).collect();
                (segment, bucket)
            })
            .collect::<HashMap<_, _>>();

        debug!(
            "path dictionary built with {} keys from {} rows",
            buckets.len(),
            rows.len()
        );
        Ok(Dictionary { buckets })
    }

    fn ends_with_key(&self, path: &str, key: &str) -> bool {
        path == key
            || path
                .strip_suffix(key)
                .is_some_and(|prefix| prefix.ends_with(self.path_separator.as_str()))
    }
}

impl RecursiveQueryBuilder {
    /// Matcher for the rows of [`RecursiveQueryBuilder::compile_batch`] with the same
    /// arguments.
    pub fn path_matcher(&self, kind: RelationKind, related: Option<&RelatedTable>) -> PathMatcher {
        let spec = self.spec();
        let matcher = PathMatcher::new(
            spec,
            &self.grammar().list_separator(&spec.path_separator),
            kind.and_self(),
        );
        match related {
            Some(related) => matcher.with_key_column(&related.foreign_key),
            None => matcher,
        }
    }
}

fn key_segment(row: &ResultRow, column: &str) -> Result<String, MatchError> {
    match row.get(column) {
        None | Some(Value::Null) => Err(MatchError::MissingKey {
            column: column.to_string(),
        }),
        Some(Value::String(key)) => Ok(key.clone()),
        Some(Value::Number(key)) => Ok(key.to_string()),
        Some(_) => Err(MatchError::InvalidKey {
            column: column.to_string(),
        }),
    }
}

/// Natural path order for rows fetched from a backend that can only order
/// lexicographically. Rows without a path sort first.
pub fn sort_rows_naturally(
    rows: &mut [ResultRow],
    path_column: &str,
    separator: &str,
) -> Result<(), GrammarError> {
    let sort_key = NaturalSortKey::new(separator)?;
    rows.sort_by_cached_key(|row| match row.get(path_column) {
        Some(Value::String(path)) => sort_key.key(path),
        Some(Value::Number(path)) => sort_key.key(&path.to_string()),
        _ => String::new(),
    });
    Ok(())
}
