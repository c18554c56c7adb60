use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("Result row has no value for key column '{column}'")]
    MissingKey { column: String },
    #[error("Key column '{column}' holds a value that cannot be a path segment")]
    InvalidKey { column: String },
}
