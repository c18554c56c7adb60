use serde_json::json;

use super::common::{alias_segment, wrap_with};
use super::natural_order::compile_lexicographic_order;
use super::{Driver, ExpressionGrammar};
use crate::hierarchy_catalog::{ColumnType, SegmentKind};
use crate::render_plan::{Binding, Query, SqlFragment};

const PATH_TYPE: &str = "VARCHAR(8191)";
const SEPARATOR_TYPE: &str = "VARCHAR(16)";

/// Firebird needs typed parameters, so every bound separator is cast; the cycle check
/// inlines the separator instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirebirdGrammar;

impl ExpressionGrammar for FirebirdGrammar {
    fn driver(&self) -> Driver {
        Driver::Firebird
    }

    fn wrap_segment(&self, segment: &str) -> String {
        wrap_with(segment, '"', '"')
    }

    fn compile_initial_path(&self, column: &str, alias: &str, _kind: SegmentKind) -> String {
        format!(
            "CAST({} AS {}) AS {}",
            self.wrap(column),
            PATH_TYPE,
            self.wrap(alias_segment(alias))
        )
    }

    fn compile_recursive_path(
        &self,
        column: &str,
        alias: &str,
        _kind: SegmentKind,
        reverse: bool,
    ) -> String {
        let previous = self.wrap(alias);
        let current = self.wrap(column);
        let separator = format!("CAST(? AS {})", SEPARATOR_TYPE);
        let concat = if reverse {
            format!("{} || {} || {}", current, separator, previous)
        } else {
            format!("{} || {} || {}", previous, separator, current)
        };
        format!(
            "CAST({} AS {}) AS {}",
            concat,
            PATH_TYPE,
            self.wrap(alias_segment(alias))
        )
    }

    fn recursive_path_bindings(&self, separator: &str) -> Vec<Binding> {
        vec![json!(separator)]
    }

    fn select_path_list(
        &self,
        mut query: Query,
        expression: &str,
        column: &str,
        _path_separator: &str,
        list_separator: &str,
    ) -> Query {
        query.add_select(SqlFragment::new(
            format!("LIST({}, CAST(? AS {}))", self.wrap(column), SEPARATOR_TYPE),
            vec![json!(list_separator)],
        ));
        query.set_from(self.wrap(expression));
        query
    }

    fn compile_order_by_path(&self, path: &str, _separator: &str, kind: SegmentKind) -> String {
        compile_lexicographic_order(self, path, kind)
    }

    fn compile_pivot_column_null_value(
        &self,
        column_type: ColumnType,
        precision: u8,
        scale: u8,
    ) -> String {
        let cast = match column_type {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Decimal => format!("DECIMAL({}, {})", precision, scale),
            ColumnType::Float => "DOUBLE PRECISION".to_string(),
            ColumnType::String | ColumnType::Text | ColumnType::Uuid | ColumnType::Json => {
                PATH_TYPE.to_string()
            }
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime => "TIMESTAMP".to_string(),
        };
        format!("CAST(NULL AS {})", cast)
    }

    fn compile_cycle_detection(
        &self,
        local_key: &str,
        path: &str,
        separator: &str,
        _kind: SegmentKind,
    ) -> String {
        let separator = self.quote_string(separator);
        format!(
            "POSITION({sep} || {} || {sep} IN {sep} || {} || {sep}) > 0",
            self.wrap(local_key),
            self.wrap(path),
            sep = separator
        )
    }

    fn cycle_detection_bindings(&self, _separator: &str) -> Vec<Binding> {
        Vec::new()
    }
}
