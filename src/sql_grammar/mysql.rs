use super::mysql_family;
use super::natural_order::{compile_natural_order, CaptureSyntax};
use super::{Driver, ExpressionGrammar};
use crate::hierarchy_catalog::{ColumnType, SegmentKind};
use crate::render_plan::{Binding, Query};

pub(super) const PATH_TYPE: &str = "CHAR(65535)";

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGrammar;

impl ExpressionGrammar for MySqlGrammar {
    fn driver(&self) -> Driver {
        Driver::MySql
    }

    fn wrap_segment(&self, segment: &str) -> String {
        mysql_family::wrap_segment(segment)
    }

    fn quote_string(&self, value: &str) -> String {
        mysql_family::quote_string(value)
    }

    fn compile_initial_path(&self, column: &str, alias: &str, _kind: SegmentKind) -> String {
        mysql_family::compile_initial_path(self, column, alias, PATH_TYPE)
    }

    fn compile_recursive_path(
        &self,
        column: &str,
        alias: &str,
        _kind: SegmentKind,
        reverse: bool,
    ) -> String {
        mysql_family::compile_recursive_path(self, column, alias, reverse)
    }

    fn recursive_path_bindings(&self, separator: &str) -> Vec<Binding> {
        mysql_family::separator_bindings(separator, 1)
    }

    fn select_path_list(
        &self,
        query: Query,
        expression: &str,
        column: &str,
        _path_separator: &str,
        list_separator: &str,
    ) -> Query {
        mysql_family::select_path_list(self, query, expression, column, list_separator)
    }

    fn compile_order_by_path(&self, path: &str, separator: &str, kind: SegmentKind) -> String {
        compile_natural_order(self, path, separator, kind, CaptureSyntax::Dollar)
    }

    fn compile_pivot_column_null_value(
        &self,
        column_type: ColumnType,
        precision: u8,
        scale: u8,
    ) -> String {
        mysql_family::compile_pivot_column_null_value(column_type, precision, scale, PATH_TYPE)
    }

    fn compile_cycle_detection(
        &self,
        local_key: &str,
        path: &str,
        _separator: &str,
        _kind: SegmentKind,
    ) -> String {
        mysql_family::compile_cycle_detection(self, local_key, path)
    }

    fn cycle_detection_bindings(&self, separator: &str) -> Vec<Binding> {
        mysql_family::separator_bindings(separator, 4)
    }
}
