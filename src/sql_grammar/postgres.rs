use serde_json::json;

use super::common::{alias_segment, wrap_with};
use super::{Driver, ExpressionGrammar};
use crate::hierarchy_catalog::{ColumnType, SegmentKind};
use crate::render_plan::{Binding, Query, SqlFragment};

/// Paths are native arrays: integer keys build `integer[]`, everything else
/// `varchar[]`. Arrays compare element by element, so ordering needs no padding and
/// the separator only matters when a path list is flattened to text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

impl PostgresGrammar {
    fn element(&self, column: &str, kind: SegmentKind) -> String {
        match kind {
            SegmentKind::Integer => self.wrap(column),
            SegmentKind::Text => format!("CAST({} AS VARCHAR)", self.wrap(column)),
        }
    }
}

impl ExpressionGrammar for PostgresGrammar {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn wrap_segment(&self, segment: &str) -> String {
        wrap_with(segment, '"', '"')
    }

    fn compile_initial_path(&self, column: &str, alias: &str, kind: SegmentKind) -> String {
        format!(
            "ARRAY[{}] AS {}",
            self.element(column, kind),
            self.wrap(alias_segment(alias))
        )
    }

    fn compile_recursive_path(
        &self,
        column: &str,
        alias: &str,
        kind: SegmentKind,
        reverse: bool,
    ) -> String {
        let previous = self.wrap(alias);
        let current = self.element(column, kind);
        let concat = if reverse {
            format!("{} || {}", current, previous)
        } else {
            format!("{} || {}", previous, current)
        };
        format!("{} AS {}", concat, self.wrap(alias_segment(alias)))
    }

    fn recursive_path_bindings(&self, _separator: &str) -> Vec<Binding> {
        Vec::new()
    }

    fn select_path_list(
        &self,
        mut query: Query,
        expression: &str,
        column: &str,
        path_separator: &str,
        list_separator: &str,
    ) -> Query {
        query.add_select(SqlFragment::new(
            format!("STRING_AGG(ARRAY_TO_STRING({}, ?), ?)", self.wrap(column)),
            vec![json!(path_separator), json!(list_separator)],
        ));
        query.set_from(self.wrap(expression));
        query
    }

    fn compile_order_by_path(&self, path: &str, _separator: &str, _kind: SegmentKind) -> String {
        format!("{} ASC", self.wrap(path))
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
            ColumnType::Decimal => format!("NUMERIC({}, {})", precision, scale),
            ColumnType::Float => "DOUBLE PRECISION".to_string(),
            ColumnType::String => "VARCHAR".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime => "TIMESTAMP".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Json => "JSON".to_string(),
        };
        format!("CAST(NULL AS {})", cast)
    }

    fn compile_cycle_detection(
        &self,
        local_key: &str,
        path: &str,
        _separator: &str,
        kind: SegmentKind,
    ) -> String {
        format!("{} = ANY({})", self.element(local_key, kind), self.wrap(path))
    }

    fn cycle_detection_bindings(&self, _separator: &str) -> Vec<Binding> {
        Vec::new()
    }
}
