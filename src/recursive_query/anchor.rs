use crate::hierarchy_catalog::{Direction, Edges, PivotColumn};
use crate::render_plan::{Join, Query, SqlFragment};
use crate::utils::cte_naming::reserved_table_hash;

use super::{CompileError, KeySet, RecursiveQueryBuilder, RootConstraint};

/// Precision used for decimal placeholders without a declared precision
const DEFAULT_DECIMAL_PRECISION: u8 = 16;

impl RecursiveQueryBuilder {
    pub(super) fn compile_anchor(&self, root: &RootConstraint) -> Result<Query, CompileError> {
        let grammar = self.grammar();
        let spec = self.spec();

        let mut query = Query::from_table(self.from_clause());
        let joins_pivot = self.apply_root_constraint(&mut query, root)?;

        query.add_select(grammar.wrap(&format!("{}.*", self.table_ref())));
        query.add_select(format!(
            "{} AS {}",
            spec.initial_depth,
            grammar.wrap(&spec.depth_column)
        ));
        query.add_select(grammar.compile_initial_path(
            &self.raw_column(&spec.local_key),
            &spec.path_column,
            self.local_kind(),
        ));
        for custom in &spec.custom_paths {
            query.add_select(grammar.compile_initial_path(
                &self.raw_column(&custom.column),
                &custom.name,
                spec.segment_kind(&custom.column),
            ));
        }

        for pivot in spec.pivot_columns() {
            let value = if joins_pivot {
                self.pivot_column(&pivot.name)
            } else {
                self.pivot_placeholder(pivot)?
            };
            query.add_select(format!("{} AS {}", value, grammar.wrap(&pivot.alias())));
        }

        if spec.cycle_detection.enabled && spec.cycle_detection.include_start {
            query.add_select(
                grammar.compile_cycle_detection_initial_select(&spec.cycle_detection.column),
            );
        }

        if let Some(constraint) = &self.constraints.initial {
            constraint(&mut query);
        }
        Ok(query)
    }

    /// Returns whether the anchor joined the pivot table.
    fn apply_root_constraint(
        &self,
        query: &mut Query,
        root: &RootConstraint,
    ) -> Result<bool, CompileError> {
        let grammar = self.grammar();
        let spec = self.spec();

        match root {
            RootConstraint::All => {}
            RootConstraint::IsRoot => match &spec.edges {
                Edges::AdjacencyList { parent_key } => {
                    query.add_filter(format!("{} IS NULL", self.column(parent_key)));
                }
                Edges::EdgeTable {
                    pivot_table,
                    child_key,
                    ..
                } => {
                    query.add_filter(format!(
                        "NOT EXISTS (SELECT 1 FROM {} WHERE {} = {})",
                        grammar.wrap(pivot_table),
                        grammar.wrap(&format!("{}.{}", pivot_table, child_key)),
                        self.column(&spec.local_key)
                    ));
                }
            },
            RootConstraint::Keys(keys) => {
                query.add_filter(keys.compile(grammar, &self.column(&spec.local_key)));
            }
            RootConstraint::AdjacentTo(keys) => return self.constrain_adjacent(query, keys),
            RootConstraint::Raw(fragment) => {
                query.add_filter(fragment.clone());
            }
        }
        Ok(false)
    }

    fn constrain_adjacent(&self, query: &mut Query, keys: &KeySet) -> Result<bool, CompileError> {
        let grammar = self.grammar();
        let spec = self.spec();

        match (&spec.edges, spec.direction) {
            (_, Direction::Bidirectional) => Err(CompileError::UnsupportedRootConstraint {
                constraint: "adjacent_to".to_string(),
                reason: "bidirectional traversals start from the rows themselves".to_string(),
            }),
            (Edges::AdjacencyList { parent_key }, Direction::Descending) => {
                query.add_filter(keys.compile(grammar, &self.column(parent_key)));
                Ok(false)
            }
            (Edges::AdjacencyList { parent_key }, Direction::Ascending) => {
                let alias = reserved_table_hash();
                let qualified = |column: &str| grammar.wrap(&format!("{}.{}", alias, column));
                let children = keys.compile(grammar, &qualified(spec.local_key.as_str()));
                query.add_filter(SqlFragment::new(
                    format!(
                        "{} IN (SELECT {} FROM {} AS {} WHERE {})",
                        self.column(&spec.local_key),
                        qualified(parent_key.as_str()),
                        grammar.wrap(&spec.table),
                        grammar.wrap_segment(&alias),
                        children.sql
                    ),
                    children.bindings,
                ));
                Ok(false)
            }
            (
                Edges::EdgeTable {
                    pivot_table,
                    parent_key,
                    child_key,
                    ..
                },
                direction,
            ) => {
                let pivot = |column: &str| grammar.wrap(&format!("{}.{}", pivot_table, column));
                let (joined_on, constrained) = if direction == Direction::Descending {
                    (child_key, parent_key)
                } else {
                    (parent_key, child_key)
                };
                query.add_join(Join::inner(
                    grammar.wrap(pivot_table),
                    format!(
                        "{} = {}",
                        pivot(joined_on.as_str()),
                        self.column(&spec.local_key)
                    ),
                ));
                query.add_filter(keys.compile(grammar, &pivot(constrained.as_str())));
                Ok(true)
            }
        }
    }

    /// Wrapped `pivot_table.column`; only meaningful for edge tables.
    pub(super) fn pivot_column(&self, column: &str) -> String {
        match &self.spec().edges {
            Edges::EdgeTable { pivot_table, .. } => {
                self.grammar().wrap(&format!("{}.{}", pivot_table, column))
            }
            Edges::AdjacencyList { .. } => self.column(column),
        }
    }

    fn pivot_placeholder(&self, pivot: &PivotColumn) -> Result<String, CompileError> {
        let column_type = pivot
            .column_type
            .ok_or_else(|| CompileError::MissingColumnType {
                column: pivot.name.clone(),
            })?;
        Ok(self.grammar().compile_pivot_column_null_value(
            column_type,
            pivot.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
            pivot.scale.unwrap_or(0),
        ))
    }
}
