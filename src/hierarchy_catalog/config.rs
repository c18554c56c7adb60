use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use validator::Validate;

use super::errors::HierarchySpecError;
use super::schema_types::{ColumnType, SegmentKind};
use crate::utils::cte_naming::DEFAULT_EXPRESSION_NAME;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Hierarchy definitions are written in YAML:
///
/// ```yaml
/// table: categories
/// local_key: id
/// edges:
///   kind: adjacency_list
///   parent_key: parent_id
/// direction: descending
/// path_separator: "."
/// custom_paths:
///   - name: slug_path
///     column: slug
///     separator: /
/// cycle_detection:
///   enabled: true
///   include_start: false
/// columns:
///   id: bigint
/// ```
///
/// Edge-table (graph) hierarchies keep their links in a pivot table:
///
/// ```yaml
/// table: nodes
/// edges:
///   kind: edge_table
///   pivot_table: edges
///   parent_key: parent_id
///   child_key: child_id
///   pivot_columns:
///     - name: label
///       type: string
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct HierarchySpec {
    #[validate(length(min = 1, message = "table name cannot be empty"))]
    pub table: String,

    #[serde(default = "default_local_key")]
    pub local_key: String,

    pub edges: Edges,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default = "default_depth_column")]
    #[validate(length(min = 1, message = "depth column cannot be empty"))]
    pub depth_column: String,

    #[serde(default = "default_path_column")]
    #[validate(length(min = 1, message = "path column cannot be empty"))]
    pub path_column: String,

    #[serde(default = "default_path_separator")]
    #[validate(length(min = 1, max = 8, message = "path separator must be 1-8 characters"))]
    pub path_separator: String,

    #[serde(default)]
    #[validate(nested)]
    pub custom_paths: Vec<CustomPath>,

    /// 0 for "and self" traversals, +1 (descending) or -1 (ascending) otherwise
    #[serde(default)]
    pub initial_depth: i32,

    #[validate(range(min = 1, max = 100000, message = "max depth must be between 1 and 100000"))]
    pub max_depth: Option<u32>,

    #[serde(default)]
    #[validate(nested)]
    pub cycle_detection: CycleDetection,

    /// Declared column types, used for integer detection and pivot placeholders
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnType>,

    #[serde(default = "default_expression_name")]
    #[validate(regex(path = *IDENTIFIER_RE, message = "expression name must be a plain identifier"))]
    pub expression_name: String,
}

fn default_local_key() -> String {
    "id".to_string()
}

fn default_depth_column() -> String {
    "depth".to_string()
}

fn default_path_column() -> String {
    "path".to_string()
}

fn default_path_separator() -> String {
    ".".to_string()
}

fn default_expression_name() -> String {
    DEFAULT_EXPRESSION_NAME.to_string()
}

fn default_cycle_column() -> String {
    "is_cycle".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Edges {
    /// Each row references its parent directly
    AdjacencyList { parent_key: String },
    /// Links live in a separate pivot table, so a node may have several parents
    EdgeTable {
        pivot_table: String,
        parent_key: String,
        child_key: String,
        #[serde(default)]
        pivot_columns: Vec<PivotColumn>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[serde(alias = "asc")]
    Ascending,
    #[default]
    #[serde(alias = "desc")]
    Descending,
    #[serde(alias = "both")]
    Bidirectional,
}

impl FromStr for Direction {
    type Err = HierarchySpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            "both" | "bidirectional" => Ok(Direction::Bidirectional),
            _ => Err(HierarchySpecError::MalformedDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
            Direction::Bidirectional => "bidirectional",
        };
        write!(f, "{}", name)
    }
}

/// Additional path accumulated next to the primary key path (e.g. a slug path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomPath {
    #[validate(length(min = 1, message = "custom path name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "custom path column cannot be empty"))]
    pub column: String,
    #[validate(length(min = 1, message = "custom path separator cannot be empty"))]
    pub separator: String,
    /// Prepend instead of append, so the path reads from the current row back
    #[serde(default)]
    pub reverse: bool,
}

impl CustomPath {
    pub fn new(name: &str, column: &str, separator: &str) -> Self {
        Self {
            name: name.to_string(),
            column: column.to_string(),
            separator: separator.to_string(),
            reverse: false,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CycleDetection {
    #[serde(default)]
    pub enabled: bool,
    /// Keep the row that closes a cycle, flagged in `column`
    #[serde(default)]
    pub include_start: bool,
    #[serde(default = "default_cycle_column")]
    #[validate(length(min = 1, message = "cycle detection column cannot be empty"))]
    pub column: String,
}

impl Default for CycleDetection {
    fn default() -> Self {
        Self {
            enabled: false,
            include_start: false,
            column: default_cycle_column(),
        }
    }
}

/// Extra column read from the pivot table of an edge-table hierarchy; projected as
/// `pivot_<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotColumn {
    pub name: String,
    /// Required only when an anchor query needs a typed NULL placeholder
    #[serde(rename = "type", default)]
    pub column_type: Option<ColumnType>,
    #[serde(default)]
    pub precision: Option<u8>,
    #[serde(default)]
    pub scale: Option<u8>,
}

impl PivotColumn {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type: Some(column_type),
            precision: None,
            scale: None,
        }
    }

    pub fn untyped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: None,
            precision: None,
            scale: None,
        }
    }

    pub fn alias(&self) -> String {
        format!("pivot_{}", self.name)
    }
}

impl HierarchySpec {
    pub fn adjacency_list(table: &str, local_key: &str, parent_key: &str) -> Self {
        Self::with_edges(
            table,
            local_key,
            Edges::AdjacencyList {
                parent_key: parent_key.to_string(),
            },
        )
    }

    pub fn edge_table(
        table: &str,
        local_key: &str,
        pivot_table: &str,
        parent_key: &str,
        child_key: &str,
    ) -> Self {
        Self::with_edges(
            table,
            local_key,
            Edges::EdgeTable {
                pivot_table: pivot_table.to_string(),
                parent_key: parent_key.to_string(),
                child_key: child_key.to_string(),
                pivot_columns: Vec::new(),
            },
        )
    }

    fn with_edges(table: &str, local_key: &str, edges: Edges) -> Self {
        Self {
            table: table.to_string(),
            local_key: local_key.to_string(),
            edges,
            direction: Direction::default(),
            depth_column: default_depth_column(),
            path_column: default_path_column(),
            path_separator: default_path_separator(),
            custom_paths: Vec::new(),
            initial_depth: 0,
            max_depth: None,
            cycle_detection: CycleDetection::default(),
            columns: BTreeMap::new(),
            expression_name: default_expression_name(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_initial_depth(mut self, initial_depth: i32) -> Self {
        self.initial_depth = initial_depth;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_cycle_detection(mut self, include_start: bool) -> Self {
        self.cycle_detection.enabled = true;
        self.cycle_detection.include_start = include_start;
        self
    }

    pub fn with_custom_path(mut self, custom_path: CustomPath) -> Self {
        self.custom_paths.push(custom_path);
        self
    }

    pub fn with_path_separator(mut self, separator: &str) -> Self {
        self.path_separator = separator.to_string();
        self
    }

    pub fn with_column_type(mut self, column: &str, column_type: ColumnType) -> Self {
        self.columns.insert(column.to_string(), column_type);
        self
    }

    pub fn with_expression_name(mut self, name: &str) -> Self {
        self.expression_name = name.to_string();
        self
    }

    /// Adds a pivot column; ignored for adjacency lists.
    pub fn with_pivot_column(mut self, column: PivotColumn) -> Self {
        if let Edges::EdgeTable { pivot_columns, .. } = &mut self.edges {
            pivot_columns.push(column);
        }
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, HierarchySpecError> {
        let spec: Self =
            serde_yaml::from_str(content).map_err(|e| HierarchySpecError::ConfigParse {
                error: e.to_string(),
            })?;
        spec.validate_spec()?;
        Ok(spec)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, HierarchySpecError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| HierarchySpecError::ConfigRead {
                error: format!("{}: {}", path.as_ref().display(), e),
            })?;
        Self::from_yaml_str(&content)
    }

    /// Structural validation plus the cross-field rules `validator` cannot express.
    pub fn validate_spec(&self) -> Result<(), HierarchySpecError> {
        self.validate()?;

        if self.local_key.trim().is_empty() {
            return Err(HierarchySpecError::missing_key("local key", &self.table));
        }
        match &self.edges {
            Edges::AdjacencyList { parent_key } => {
                if parent_key.trim().is_empty() {
                    return Err(HierarchySpecError::missing_key("parent key", &self.table));
                }
            }
            Edges::EdgeTable {
                pivot_table,
                parent_key,
                child_key,
                ..
            } => {
                if pivot_table.trim().is_empty() {
                    return Err(HierarchySpecError::missing_key("pivot table", &self.table));
                }
                if parent_key.trim().is_empty() {
                    return Err(HierarchySpecError::missing_key("parent key", pivot_table));
                }
                if child_key.trim().is_empty() {
                    return Err(HierarchySpecError::missing_key("child key", pivot_table));
                }
            }
        }

        let depth_ok = match self.direction {
            Direction::Descending => self.initial_depth >= 0,
            Direction::Ascending => self.initial_depth <= 0,
            Direction::Bidirectional => self.initial_depth == 0,
        };
        if !depth_ok {
            return Err(HierarchySpecError::InvalidInitialDepth {
                direction: self.direction,
                depth: self.initial_depth,
            });
        }

        let mut produced = HashSet::new();
        for name in self.generated_columns() {
            if !produced.insert(name.clone()) {
                return Err(HierarchySpecError::DuplicatePathName(name));
            }
        }

        if self.is_graph() && !self.cycle_detection.enabled && self.max_depth.is_none() {
            warn!(
                "edge table hierarchy '{}' has neither cycle detection nor a max depth",
                self.table
            );
        }
        Ok(())
    }

    /// Columns the recursive expression adds on top of the base table's columns.
    pub fn generated_columns(&self) -> Vec<String> {
        let mut columns = vec![self.depth_column.clone(), self.path_column.clone()];
        columns.extend(self.custom_paths.iter().map(|p| p.name.clone()));
        columns.extend(self.pivot_columns().iter().map(|c| c.alias()));
        if self.cycle_detection.enabled && self.cycle_detection.include_start {
            columns.push(self.cycle_detection.column.clone());
        }
        columns
    }

    pub fn is_graph(&self) -> bool {
        matches!(self.edges, Edges::EdgeTable { .. })
    }

    pub fn pivot_columns(&self) -> &[PivotColumn] {
        match &self.edges {
            Edges::AdjacencyList { .. } => &[],
            Edges::EdgeTable { pivot_columns, .. } => pivot_columns,
        }
    }

    pub fn is_integer_column(&self, column: &str) -> bool {
        self.columns
            .get(column)
            .map(|t| t.is_integer())
            .unwrap_or(false)
    }

    pub fn segment_kind(&self, column: &str) -> SegmentKind {
        if self.is_integer_column(column) {
            SegmentKind::Integer
        } else {
            SegmentKind::Text
        }
    }
}
