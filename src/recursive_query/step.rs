use crate::hierarchy_catalog::{Direction, Edges};
use crate::render_plan::{Join, Query, SqlFragment};

use super::RecursiveQueryBuilder;

impl RecursiveQueryBuilder {
    pub(super) fn compile_step(&self) -> Query {
        let grammar = self.grammar();
        let spec = self.spec();

        let mut query = Query::from_table(self.from_clause());
        query.add_select(grammar.wrap(&format!("{}.*", self.table_ref())));
        query.add_select(self.step_depth());
        query.add_select(SqlFragment::new(
            grammar.compile_recursive_path(
                &self.raw_column(&spec.local_key),
                &self.raw_expression_column(&spec.path_column),
                self.local_kind(),
                false,
            ),
            grammar.recursive_path_bindings(&spec.path_separator),
        ));
        for custom in &spec.custom_paths {
            query.add_select(SqlFragment::new(
                grammar.compile_recursive_path(
                    &self.raw_column(&custom.column),
                    &self.raw_expression_column(&custom.name),
                    spec.segment_kind(&custom.column),
                    custom.reverse,
                ),
                grammar.recursive_path_bindings(&custom.separator),
            ));
        }
        for pivot in spec.pivot_columns() {
            query.add_select(format!(
                "{} AS {}",
                self.pivot_column(&pivot.name),
                grammar.wrap(&pivot.alias())
            ));
        }

        self.join_expression(&mut query);
        self.apply_max_depth(&mut query);
        self.apply_cycle_detection(&mut query);

        if let Some(constraint) = &self.constraints.recursive {
            constraint(&mut query);
        }
        query
    }

    fn step_depth(&self) -> String {
        let spec = self.spec();
        let depth = self.expression_column(&spec.depth_column);
        let next = match spec.direction {
            Direction::Descending => format!("{} + 1", depth),
            Direction::Ascending => format!("{} - 1", depth),
            Direction::Bidirectional => format!(
                "{} + CASE WHEN {} THEN 1 ELSE -1 END",
                depth,
                self.descends_predicate()
            ),
        };
        format!("{} AS {}", next, self.grammar().wrap(&spec.depth_column))
    }

    /// The candidate row is a child of the previous row, reached on the downward side.
    fn descends_predicate(&self) -> String {
        let spec = self.spec();
        let depth = self.expression_column(&spec.depth_column);
        let local = self.expression_column(&spec.local_key);
        match &spec.edges {
            Edges::AdjacencyList { parent_key } => format!(
                "{} = {} AND {} >= 0",
                self.column(parent_key),
                local,
                depth
            ),
            Edges::EdgeTable {
                parent_key,
                child_key,
                ..
            } => format!(
                "{} = {} AND {} = {} AND {} >= 0",
                self.pivot_column(parent_key),
                local,
                self.pivot_column(child_key),
                self.column(&spec.local_key),
                depth
            ),
        }
    }

    /// The candidate row is a parent of the previous row, reached on the upward side.
    fn ascends_predicate(&self) -> String {
        let spec = self.spec();
        let depth = self.expression_column(&spec.depth_column);
        match &spec.edges {
            Edges::AdjacencyList { parent_key } => format!(
                "{} = {} AND {} <= 0",
                self.column(&spec.local_key),
                self.expression_column(parent_key),
                depth
            ),
            Edges::EdgeTable {
                parent_key,
                child_key,
                ..
            } => format!(
                "{} = {} AND {} = {} AND {} <= 0",
                self.pivot_column(child_key),
                self.expression_column(&spec.local_key),
                self.pivot_column(parent_key),
                self.column(&spec.local_key),
                depth
            ),
        }
    }

    fn join_expression(&self, query: &mut Query) {
        let grammar = self.grammar();
        let spec = self.spec();
        let expression = grammar.wrap(&spec.expression_name);
        let local = self.column(&spec.local_key);
        let expression_local = self.expression_column(&spec.local_key);

        match &spec.edges {
            Edges::AdjacencyList { parent_key } => {
                let parent = self.column(parent_key);
                let expression_parent = self.expression_column(parent_key);
                let on = match spec.direction {
                    Direction::Descending => format!("{} = {}", parent, expression_local),
                    Direction::Ascending => format!("{} = {}", local, expression_parent),
                    Direction::Bidirectional => format!(
                        "{} = {} OR {} = {}",
                        parent, expression_local, local, expression_parent
                    ),
                };
                query.add_join(Join::inner(expression, on));
            }
            Edges::EdgeTable {
                pivot_table,
                parent_key,
                child_key,
                ..
            } => {
                let pivot_parent = self.pivot_column(parent_key);
                let pivot_child = self.pivot_column(child_key);
                let (pivot_on, expression_on) = match spec.direction {
                    Direction::Descending => (
                        format!("{} = {}", pivot_child, local),
                        format!("{} = {}", expression_local, pivot_parent),
                    ),
                    Direction::Ascending => (
                        format!("{} = {}", pivot_parent, local),
                        format!("{} = {}", expression_local, pivot_child),
                    ),
                    Direction::Bidirectional => (
                        format!("{} = {} OR {} = {}", pivot_child, local, pivot_parent, local),
                        format!(
                            "{} = {} OR {} = {}",
                            expression_local, pivot_parent, expression_local, pivot_child
                        ),
                    ),
                };
                query.add_join(Join::inner(grammar.wrap(pivot_table), pivot_on));
                query.add_join(Join::inner(expression, expression_on));
            }
        }

        if spec.direction == Direction::Bidirectional {
            let either = SqlFragment::disjunction(vec![
                self.descends_predicate().into(),
                self.ascends_predicate().into(),
            ]);
            query.add_filter(format!("({})", either.sql));
        }
    }

    /// No produced row may reach `|depth| >= max_depth`, so the step stops one level
    /// early.
    fn apply_max_depth(&self, query: &mut Query) {
        let spec = self.spec();
        let Some(max_depth) = spec.max_depth else {
            return;
        };
        let limit = i64::from(max_depth) - 1;
        let depth = self.expression_column(&spec.depth_column);
        let guard = match spec.direction {
            Direction::Descending => format!("{} < {}", depth, limit),
            Direction::Ascending => format!("{} > {}", depth, -limit),
            Direction::Bidirectional => format!("ABS({}) < {}", depth, limit),
        };
        query.add_filter(guard);
    }
}
