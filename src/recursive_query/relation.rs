use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hierarchy_catalog::Direction;
use crate::render_plan::{Binding, Query};

use super::{CompileError, KeySet, RecursiveQueryBuilder, RootConstraint};

/// Relationship between the start rows and the rows a query returns.
///
/// Every kind anchors on the start rows themselves at depth 0, so the start key is
/// always the first path segment. Kinds without "and self" filter those rows out again
/// in the outer query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Ancestors,
    AncestorsAndSelf,
    Descendants,
    DescendantsAndSelf,
    /// Ancestors, the row itself and descendants
    Bloodline,
    /// Every root and everything below it; start keys are ignored
    Tree,
}

impl RelationKind {
    pub fn direction(&self) -> Direction {
        match self {
            RelationKind::Ancestors | RelationKind::AncestorsAndSelf => Direction::Ascending,
            RelationKind::Descendants | RelationKind::DescendantsAndSelf | RelationKind::Tree => {
                Direction::Descending
            }
            RelationKind::Bloodline => Direction::Bidirectional,
        }
    }

    pub fn and_self(&self) -> bool {
        !matches!(self, RelationKind::Ancestors | RelationKind::Descendants)
    }

    /// Relations whose rows can be bucketed by a path dictionary.
    pub fn is_descending(&self) -> bool {
        matches!(
            self,
            RelationKind::Descendants | RelationKind::DescendantsAndSelf
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            RelationKind::Ancestors => "ancestors",
            RelationKind::AncestorsAndSelf => "ancestors_and_self",
            RelationKind::Descendants => "descendants",
            RelationKind::DescendantsAndSelf => "descendants_and_self",
            RelationKind::Bloodline => "bloodline",
            RelationKind::Tree => "tree",
        }
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "ancestors" => Ok(RelationKind::Ancestors),
            "ancestors_and_self" => Ok(RelationKind::AncestorsAndSelf),
            "descendants" => Ok(RelationKind::Descendants),
            "descendants_and_self" => Ok(RelationKind::DescendantsAndSelf),
            "bloodline" => Ok(RelationKind::Bloodline),
            "tree" => Ok(RelationKind::Tree),
            _ => Err(format!(
                "Unknown relation: '{}'. Supported: ancestors, ancestors_and_self, descendants, \
                 descendants_and_self, bloodline, tree",
                s
            )),
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl RecursiveQueryBuilder {
    pub fn compile_relation(
        &self,
        kind: RelationKind,
        keys: &[Binding],
    ) -> Result<Query, CompileError> {
        let builder = self.derive(kind.direction(), 0);
        let root = match kind {
            RelationKind::Tree => RootConstraint::IsRoot,
            _ => RootConstraint::Keys(KeySet::Values(keys.to_vec())),
        };

        let mut query = builder.compile(&root)?;
        if !kind.and_self() {
            query.add_filter(format!(
                "{} <> 0",
                builder.expression_column(&builder.spec().depth_column)
            ));
        }
        Ok(query)
    }
}
