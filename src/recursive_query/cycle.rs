//! Cycle detection for graphs whose edges loop back.
//!
//! The step query checks whether the candidate row's key already occurs as a whole
//! segment of the path that led to it. With `include_start` off such rows are dropped.
//! With it on, the closing row is kept once, flagged in the cycle column, and the next
//! step refuses to continue from any flagged row.

use crate::render_plan::{Query, SqlFragment};

use super::RecursiveQueryBuilder;

impl RecursiveQueryBuilder {
    /// `would_cycle(candidate_key, current_path)` for the step query.
    pub fn would_cycle_expression(&self) -> SqlFragment {
        let grammar = self.grammar();
        let spec = self.spec();
        SqlFragment::new(
            grammar.compile_cycle_detection(
                &self.raw_column(&spec.local_key),
                &self.raw_expression_column(&spec.path_column),
                &spec.path_separator,
                self.local_kind(),
            ),
            grammar.cycle_detection_bindings(&spec.path_separator),
        )
    }

    pub(super) fn apply_cycle_detection(&self, query: &mut Query) {
        let grammar = self.grammar();
        let cycle = &self.spec().cycle_detection;
        if !cycle.enabled {
            return;
        }

        let would_cycle = self.would_cycle_expression();
        if cycle.include_start {
            query.add_select(SqlFragment::new(
                grammar.compile_cycle_detection_recursive_select(&would_cycle.sql, &cycle.column),
                would_cycle.bindings,
            ));
            query.add_filter(
                grammar.compile_cycle_detection_stop_constraint(
                    &self.raw_expression_column(&cycle.column),
                ),
            );
        } else {
            query.add_filter(would_cycle.negated());
        }
    }
}
