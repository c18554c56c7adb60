//! adjacency-cte - recursive CTE compiler for hierarchies stored in SQL tables
//!
//! Records kept as an adjacency list (a parent key column) or as a graph (a separate
//! edge table) are resolved in one round trip through a recursive common table
//! expression. This crate provides:
//! - Hierarchy definitions loaded from YAML
//! - One expression grammar per backend (MySQL, MariaDB, SingleStore, PostgreSQL,
//!   SQLite, SQL Server, Firebird)
//! - Relation, batch, existence and write queries with depth, path and cycle columns
//! - Path dictionaries that fan batched rows back out to their requesting keys
//!
//! Nothing is executed here: every compiled query is SQL text plus positional bindings.

pub mod utils;

pub mod config;
pub mod hierarchy_catalog;
pub mod path_matcher;
pub mod recursive_query;
pub mod render_plan;
pub mod sql_grammar;
