//! Database-agnostic column types for hierarchy definitions
//!
//! Declared types matter in two places only: integer detection (natural path
//! ordering, Postgres array element types) and the typed `NULL` placeholders an anchor
//! query needs for pivot columns.
//!
//! ```yaml
//! columns:
//!   id: bigint
//!   slug: string
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "long")]
    BigInt,
    SmallInt,
    #[serde(alias = "bool")]
    Boolean,
    Decimal,
    #[serde(alias = "double")]
    Float,
    #[serde(alias = "varchar")]
    String,
    Text,
    Date,
    #[serde(alias = "timestamp")]
    DateTime,
    Uuid,
    Json,
}

impl ColumnType {
    /// Integer-family types, whose path segments sort numerically
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::BigInt | ColumnType::SmallInt
        )
    }
}

impl FromStr for ColumnType {
    type Err = String;

    /// Case-insensitive, accepts the same aliases as the YAML form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "integer" | "int" => Ok(ColumnType::Integer),
            "bigint" | "long" => Ok(ColumnType::BigInt),
            "smallint" => Ok(ColumnType::SmallInt),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "decimal" => Ok(ColumnType::Decimal),
            "float" | "double" => Ok(ColumnType::Float),
            "string" | "varchar" => Ok(ColumnType::String),
            "text" => Ok(ColumnType::Text),
            "date" => Ok(ColumnType::Date),
            "datetime" | "timestamp" => Ok(ColumnType::DateTime),
            "uuid" => Ok(ColumnType::Uuid),
            "json" => Ok(ColumnType::Json),
            _ => Err(format!(
                "Unknown column type: '{}'. Supported: integer, bigint, smallint, boolean, \
                 decimal, float, string, text, date, datetime, uuid, json",
                s
            )),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::SmallInt => "smallint",
            ColumnType::Boolean => "boolean",
            ColumnType::Decimal => "decimal",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Uuid => "uuid",
            ColumnType::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// How a key column's values behave as path segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Integer,
    Text,
}

impl SegmentKind {
    pub fn is_integer(&self) -> bool {
        matches!(self, SegmentKind::Integer)
    }
}
