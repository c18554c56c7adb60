use log::debug;
use serde::{Deserialize, Serialize};

use crate::hierarchy_catalog::Direction;
use crate::render_plan::{Binding, Query, SqlFragment, ToSql};

use super::{CompileError, KeySet, RecursiveQueryBuilder, RelationKind, RootConstraint};

/// Column holding each returned row's aggregated path list
pub const PATH_LIST_COLUMN: &str = "adjacency_paths";

/// Table whose rows are loaded for the reached hierarchy rows, e.g. the posts of every
/// descendant category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTable {
    pub table: String,
    /// Column of `table` that references the hierarchy's local key
    pub foreign_key: String,
}

impl RelatedTable {
    pub fn new(table: &str, foreign_key: &str) -> Self {
        Self {
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
        }
    }
}

impl RecursiveQueryBuilder {
    /// One query for every requesting key. Each returned row carries all of its paths
    /// in [`PATH_LIST_COLUMN`] so [`crate::path_matcher::PathMatcher`] can hand it back
    /// to every key it descends from.
    pub fn compile_batch(
        &self,
        kind: RelationKind,
        keys: &[Binding],
        related: Option<&RelatedTable>,
    ) -> Result<Query, CompileError> {
        if !kind.is_descending() {
            return Err(CompileError::UnsupportedRelationPlacement {
                relation: kind.to_string(),
                placement: "a batched path dictionary load".to_string(),
            });
        }

        let builder = self.derive(Direction::Descending, 0);
        let spec = builder.spec();
        let grammar = builder.grammar();
        let expression = builder
            .compile_expression(&RootConstraint::Keys(KeySet::Values(keys.to_vec())))?;
        let name = expression.name.clone();

        let (target_table, target_key) = match related {
            Some(related) => (related.table.as_str(), related.foreign_key.as_str()),
            None => (spec.table.as_str(), spec.local_key.as_str()),
        };
        let target_key = grammar.wrap(&format!("{}.{}", target_table, target_key));
        let expression_local = builder.expression_column(&spec.local_key);

        let mut paths = grammar.select_path_list(
            Query::new(),
            &name,
            &builder.raw_expression_column(&spec.path_column),
            &spec.path_separator,
            &grammar.list_separator(&spec.path_separator),
        );
        paths.add_filter(format!("{} = {}", expression_local, target_key));

        let mut reached = Query::from_table(grammar.wrap(&name));
        reached.add_select(expression_local.clone());
        if !kind.and_self() {
            reached.add_filter(format!(
                "{} <> 0",
                builder.expression_column(&spec.depth_column)
            ));
        }
        let reached = SqlFragment::subquery(&reached);

        let mut query = Query::from_table(grammar.wrap(target_table));
        query.add_select(grammar.wrap(&format!("{}.*", target_table)));
        query.add_select(SqlFragment::subquery(&paths).aliased(&grammar.wrap(PATH_LIST_COLUMN)));
        query.add_filter(SqlFragment::new(
            format!("{} IN {}", target_key, reached.sql),
            reached.bindings,
        ));
        query.add_cte(grammar.recursive_keyword(), expression.into_cte(grammar));

        debug!(
            "compiled batched {} for {} keys of '{}': {}",
            kind,
            keys.len(),
            target_table,
            query.to_sql()
        );
        Ok(query)
    }
}
