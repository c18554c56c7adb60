use thiserror::Error;

use crate::hierarchy_catalog::HierarchySpecError;
use crate::sql_grammar::GrammarError;

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Spec(#[from] HierarchySpecError),
    #[error("Pivot column '{column}' needs a declared type for its NULL placeholder")]
    MissingColumnType { column: String },
    #[error("{driver} does not support {feature}")]
    UnsupportedFeature { driver: String, feature: String },
    #[error("Relation '{relation}' cannot be used as {placement}")]
    UnsupportedRelationPlacement { relation: String, placement: String },
    #[error("Root constraint '{constraint}' is not supported: {reason}")]
    UnsupportedRootConstraint { constraint: String, reason: String },
    #[error("Update needs at least one column assignment")]
    EmptyAssignment,
}

impl CompileError {
    pub fn unsupported_feature(driver: impl ToString, feature: impl Into<String>) -> Self {
        CompileError::UnsupportedFeature {
            driver: driver.to_string(),
            feature: feature.into(),
        }
    }
}
