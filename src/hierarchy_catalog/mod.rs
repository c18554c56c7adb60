//! Hierarchy definitions: which table, which keys, how paths and depths are named.

pub mod config;
pub mod errors;
pub mod schema_types;

pub use config::{CustomPath, CycleDetection, Direction, Edges, HierarchySpec, PivotColumn};
pub use errors::HierarchySpecError;
pub use schema_types::{ColumnType, SegmentKind};
