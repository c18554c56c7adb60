use serde_json::json;

use super::common::{alias_segment, wrap_with};
use super::natural_order::compile_lexicographic_order;
use super::{Driver, ExpressionGrammar};
use crate::hierarchy_catalog::{ColumnType, SegmentKind};
use crate::render_plan::{Binding, Query, SqlFragment};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGrammar;

impl ExpressionGrammar for SqliteGrammar {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn wrap_segment(&self, segment: &str) -> String {
        wrap_with(segment, '"', '"')
    }

    fn compile_initial_path(&self, column: &str, alias: &str, _kind: SegmentKind) -> String {
        format!(
            "CAST({} AS TEXT) AS {}",
            self.wrap(column),
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
        let concat = if reverse {
            format!("{} || ? || {}", current, previous)
        } else {
            format!("{} || ? || {}", previous, current)
        };
        format!("{} AS {}", concat, self.wrap(alias_segment(alias)))
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
            format!("GROUP_CONCAT({}, ?)", self.wrap(column)),
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
        _precision: u8,
        _scale: u8,
    ) -> String {
        let affinity = match column_type {
            ColumnType::Integer
            | ColumnType::BigInt
            | ColumnType::SmallInt
            | ColumnType::Boolean => "INTEGER",
            ColumnType::Decimal => "NUMERIC",
            ColumnType::Float => "REAL",
            ColumnType::String
            | ColumnType::Text
            | ColumnType::Date
            | ColumnType::DateTime
            | ColumnType::Uuid
            | ColumnType::Json => "TEXT",
        };
        format!("CAST(NULL AS {})", affinity)
    }

    fn compile_cycle_detection(
        &self,
        local_key: &str,
        path: &str,
        _separator: &str,
        _kind: SegmentKind,
    ) -> String {
        format!(
            "INSTR(? || {} || ?, ? || {} || ?) > 0",
            self.wrap(path),
            self.wrap(local_key)
        )
    }

    fn cycle_detection_bindings(&self, separator: &str) -> Vec<Binding> {
        vec![json!(separator); 4]
    }
}
