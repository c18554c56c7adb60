//! Per-backend SQL fragments for recursive expressions.
//!
//! The assembler in [`crate::recursive_query`] never writes dialect-specific SQL
//! itself. Anything that differs between backends (path types, concatenation,
//! aggregated path lists, typed NULLs, the cycle predicate, identifier quoting) comes
//! from an [`ExpressionGrammar`] picked by [`grammar_for`].
//!
//! Column arguments are unwrapped, possibly qualified names such as `nodes.id` or
//! `adjacency_cte.path`; grammars wrap them. Returned fragments use `?` placeholders
//! whose values come from the matching `*_bindings` method.

pub mod common;
pub mod errors;
pub mod natural_order;

mod firebird;
mod mariadb;
mod mysql;
mod mysql_family;
mod postgres;
mod single_store;
mod sql_server;
mod sqlite;

use std::fmt;
use std::str::FromStr;

use crate::hierarchy_catalog::{ColumnType, SegmentKind};
use crate::render_plan::{Binding, Query};

pub use errors::GrammarError;
pub use firebird::FirebirdGrammar;
pub use mariadb::MariaDbGrammar;
pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use single_store::SingleStoreGrammar;
pub use sql_server::SqlServerGrammar;
pub use sqlite::SqliteGrammar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    MySql,
    MariaDb,
    SingleStore,
    Postgres,
    Sqlite,
    SqlServer,
    Firebird,
}

impl Driver {
    pub fn all() -> [Driver; 7] {
        [
            Driver::MySql,
            Driver::MariaDb,
            Driver::SingleStore,
            Driver::Postgres,
            Driver::Sqlite,
            Driver::SqlServer,
            Driver::Firebird,
        ]
    }

    /// Identifier used in configuration and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::MariaDb => "mariadb",
            Driver::SingleStore => "singlestore",
            Driver::Postgres => "pgsql",
            Driver::Sqlite => "sqlite",
            Driver::SqlServer => "sqlsrv",
            Driver::Firebird => "firebird",
        }
    }
}

impl FromStr for Driver {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(Driver::MySql),
            "mariadb" => Ok(Driver::MariaDb),
            "singlestore" => Ok(Driver::SingleStore),
            "pgsql" | "postgres" | "postgresql" => Ok(Driver::Postgres),
            "sqlite" => Ok(Driver::Sqlite),
            "sqlsrv" => Ok(Driver::SqlServer),
            "firebird" => Ok(Driver::Firebird),
            _ => Err(GrammarError::UnsupportedDriver(s.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub fn grammar_for(driver: Driver) -> Box<dyn ExpressionGrammar> {
    match driver {
        Driver::MySql => Box::new(MySqlGrammar),
        Driver::MariaDb => Box::new(MariaDbGrammar),
        Driver::SingleStore => Box::new(SingleStoreGrammar),
        Driver::Postgres => Box::new(PostgresGrammar),
        Driver::Sqlite => Box::new(SqliteGrammar),
        Driver::SqlServer => Box::new(SqlServerGrammar),
        Driver::Firebird => Box::new(FirebirdGrammar),
    }
}

/// Resolves a driver identifier such as `pgsql` to its grammar.
pub fn grammar_for_name(name: &str) -> Result<Box<dyn ExpressionGrammar>, GrammarError> {
    Ok(grammar_for(name.parse()?))
}

pub trait ExpressionGrammar: fmt::Debug + Send + Sync {
    fn driver(&self) -> Driver;

    /// Quotes a single identifier segment.
    fn wrap_segment(&self, segment: &str) -> String;

    fn wrap(&self, value: &str) -> String {
        common::wrap_identifier(value, &|segment| self.wrap_segment(segment))
    }

    fn quote_string(&self, value: &str) -> String {
        common::quote_string(value)
    }

    /// Anchor path: the start column cast to the backend's path type, aliased.
    fn compile_initial_path(&self, column: &str, alias: &str, kind: SegmentKind) -> String;

    /// Step path: `alias` is the qualified path column of the previous row; the result is
    /// aliased with its last segment.
    fn compile_recursive_path(
        &self,
        column: &str,
        alias: &str,
        kind: SegmentKind,
        reverse: bool,
    ) -> String;

    fn recursive_path_bindings(&self, separator: &str) -> Vec<Binding>;

    /// Aggregates every `column` of `expression` into one string on `query`.
    fn select_path_list(
        &self,
        query: Query,
        expression: &str,
        column: &str,
        path_separator: &str,
        list_separator: &str,
    ) -> Query;

    fn compile_order_by_path(&self, path: &str, separator: &str, kind: SegmentKind) -> String;

    fn compile_pivot_column_null_value(
        &self,
        column_type: ColumnType,
        precision: u8,
        scale: u8,
    ) -> String;

    /// True when `local_key` already appears as a whole segment of `path`. Backends that
    /// bind the separator ignore `separator` here and return it from
    /// [`cycle_detection_bindings`](Self::cycle_detection_bindings).
    fn compile_cycle_detection(
        &self,
        local_key: &str,
        path: &str,
        separator: &str,
        kind: SegmentKind,
    ) -> String;

    fn cycle_detection_bindings(&self, separator: &str) -> Vec<Binding>;

    fn compile_cycle_detection_initial_select(&self, column: &str) -> String {
        format!("FALSE AS {}", self.wrap(column))
    }

    fn compile_cycle_detection_recursive_select(&self, sql: &str, column: &str) -> String {
        format!("{} AS {}", sql, self.wrap(column))
    }

    fn compile_cycle_detection_stop_constraint(&self, column: &str) -> String {
        format!("NOT {}", self.wrap(column))
    }

    fn supports_union_all_in_recursive_expression(&self) -> bool {
        true
    }

    /// Whether a recursive expression may appear inside a subquery.
    fn supports_nested_recursive_expression(&self) -> bool {
        true
    }

    /// Whether `WITH ... UPDATE/DELETE` is accepted, as opposed to a `WITH` inside the
    /// `IN (...)` subquery.
    fn supports_expression_before_write(&self) -> bool {
        true
    }

    fn recursive_keyword(&self) -> &'static str {
        "WITH RECURSIVE"
    }

    fn list_separator(&self, path_separator: &str) -> String {
        path_separator.repeat(2)
    }
}
