//! Helpers shared by MySQL, MariaDB and SingleStore: `CONCAT` paths, `INSTR` cycle
//! checks and `GROUP_CONCAT` path lists.

use serde_json::json;

use super::common::{alias_segment, wrap_with};
use super::ExpressionGrammar;
use crate::hierarchy_catalog::ColumnType;
use crate::render_plan::{Binding, Query};

pub(super) fn wrap_segment(segment: &str) -> String {
    wrap_with(segment, '`', '`')
}

/// Backslashes are escapes in MySQL string literals unless `NO_BACKSLASH_ESCAPES` is
/// set, so they are doubled along with quotes.
pub(super) fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

pub(super) fn compile_initial_path<G: ExpressionGrammar + ?Sized>(
    grammar: &G,
    column: &str,
    alias: &str,
    path_type: &str,
) -> String {
    format!(
        "CAST({} AS {}) AS {}",
        grammar.wrap(column),
        path_type,
        grammar.wrap(alias_segment(alias))
    )
}

pub(super) fn compile_recursive_path<G: ExpressionGrammar + ?Sized>(
    grammar: &G,
    column: &str,
    alias: &str,
    reverse: bool,
) -> String {
    let previous = grammar.wrap(alias);
    let current = grammar.wrap(column);
    let concat = if reverse {
        format!("CONCAT({}, ?, {})", current, previous)
    } else {
        format!("CONCAT({}, ?, {})", previous, current)
    };
    format!("{} AS {}", concat, grammar.wrap(alias_segment(alias)))
}

pub(super) fn separator_bindings(separator: &str, count: usize) -> Vec<Binding> {
    (0..count).map(|_| json!(separator)).collect()
}

pub(super) fn select_path_list<G: ExpressionGrammar + ?Sized>(
    grammar: &G,
    mut query: Query,
    expression: &str,
    column: &str,
    list_separator: &str,
) -> Query {
    query.add_select(format!(
        "GROUP_CONCAT({} SEPARATOR {})",
        grammar.wrap(column),
        grammar.quote_string(list_separator)
    ));
    query.set_from(grammar.wrap(expression));
    query
}

/// `INSTR(CONCAT(sep, path, sep), CONCAT(sep, key, sep)) > 0`, four bound separators.
pub(super) fn compile_cycle_detection<G: ExpressionGrammar + ?Sized>(
    grammar: &G,
    local_key: &str,
    path: &str,
) -> String {
    format!(
        "INSTR(CONCAT(?, {}, ?), CONCAT(?, {}, ?)) > 0",
        grammar.wrap(path),
        grammar.wrap(local_key)
    )
}

pub(super) fn compile_pivot_column_null_value(
    column_type: ColumnType,
    precision: u8,
    scale: u8,
    string_type: &str,
) -> String {
    let cast = match column_type {
        ColumnType::Integer | ColumnType::BigInt | ColumnType::SmallInt | ColumnType::Boolean => {
            "SIGNED".to_string()
        }
        ColumnType::Decimal => format!("DECIMAL({}, {})", precision, scale),
        ColumnType::Float => "DOUBLE".to_string(),
        ColumnType::String | ColumnType::Text | ColumnType::Uuid => string_type.to_string(),
        ColumnType::Date => "DATE".to_string(),
        ColumnType::DateTime => "DATETIME".to_string(),
        ColumnType::Json => "JSON".to_string(),
    };
    format!("CAST(NULL AS {})", cast)
}
