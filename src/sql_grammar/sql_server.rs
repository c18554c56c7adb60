use serde_json::json;

use super::common::{alias_segment, wrap_with};
use super::natural_order::compile_lexicographic_order;
use super::{Driver, ExpressionGrammar};
use crate::hierarchy_catalog::{ColumnType, SegmentKind};
use crate::render_plan::{Binding, Query, SqlFragment};

const PATH_TYPE: &str = "VARCHAR(MAX)";

/// SQL Server: `+` concatenation, `BIT` flags instead of booleans, plain `WITH`, and
/// no recursive expression inside a subquery.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerGrammar;

impl SqlServerGrammar {
    fn as_path(&self, column: &str) -> String {
        format!("CAST({} AS {})", self.wrap(column), PATH_TYPE)
    }
}

impl ExpressionGrammar for SqlServerGrammar {
    fn driver(&self) -> Driver {
        Driver::SqlServer
    }

    fn wrap_segment(&self, segment: &str) -> String {
        wrap_with(segment, '[', ']')
    }

    fn compile_initial_path(&self, column: &str, alias: &str, _kind: SegmentKind) -> String {
        format!(
            "{} AS {}",
            self.as_path(column),
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
        let current = self.as_path(column);
        let concat = if reverse {
            format!("{} + ? + {}", current, previous)
        } else {
            format!("{} + ? + {}", previous, current)
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
            format!("STRING_AGG({}, ?)", self.as_path(column)),
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
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Boolean => "BIT".to_string(),
            ColumnType::Decimal => format!("DECIMAL({}, {})", precision, scale),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::String | ColumnType::Text | ColumnType::Json => "NVARCHAR(MAX)".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime => "DATETIME2".to_string(),
            ColumnType::Uuid => "UNIQUEIDENTIFIER".to_string(),
        };
        format!("CAST(NULL AS {})", cast)
    }

    fn compile_cycle_detection(
        &self,
        local_key: &str,
        path: &str,
        _separator: &str,
        _kind: SegmentKind,
    ) -> String {
        format!(
            "CHARINDEX(? + {} + ?, ? + {} + ?) > 0",
            self.as_path(local_key),
            self.wrap(path)
        )
    }

    fn cycle_detection_bindings(&self, separator: &str) -> Vec<Binding> {
        vec![json!(separator); 4]
    }

    fn compile_cycle_detection_initial_select(&self, column: &str) -> String {
        format!("CAST(0 AS BIT) AS {}", self.wrap(column))
    }

    fn compile_cycle_detection_recursive_select(&self, sql: &str, column: &str) -> String {
        format!(
            "CAST(CASE WHEN {} THEN 1 ELSE 0 END AS BIT) AS {}",
            sql,
            self.wrap(column)
        )
    }

    fn compile_cycle_detection_stop_constraint(&self, column: &str) -> String {
        format!("{} = 0", self.wrap(column))
    }

    fn supports_nested_recursive_expression(&self) -> bool {
        false
    }

    fn recursive_keyword(&self) -> &'static str {
        "WITH"
    }
}
