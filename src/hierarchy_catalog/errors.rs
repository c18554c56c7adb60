//! # Hierarchy spec errors
//!
//! Everything here is a programming or configuration error: it is raised while a
//! spec is loaded or validated, before any query is built, and is never retried.

use thiserror::Error;

use super::config::Direction;

#[derive(Debug, Clone, Error)]
pub enum HierarchySpecError {
    #[error("Malformed direction '{0}' (expected ascending, descending or bidirectional)")]
    MalformedDirection(String),
    #[error("Missing required key column: {role} is empty for table '{table}'")]
    MissingKeyColumn { role: String, table: String },
    #[error("Initial depth {depth} is invalid for a {direction} traversal")]
    InvalidInitialDepth { direction: Direction, depth: i32 },
    #[error("Column name '{0}' is produced more than once by the recursive expression")]
    DuplicatePathName(String),
    #[error("Invalid hierarchy spec: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Failed to read hierarchy spec: {error}")]
    ConfigRead { error: String },
    #[error("Failed to parse hierarchy spec: {error}")]
    ConfigParse { error: String },
}

impl HierarchySpecError {
    pub fn missing_key(role: impl Into<String>, table: impl Into<String>) -> Self {
        HierarchySpecError::MissingKeyColumn {
            role: role.into(),
            table: table.into(),
        }
    }
}
