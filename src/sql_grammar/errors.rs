use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GrammarError {
    #[error(
        "Unsupported database driver '{0}' (supported: mysql, mariadb, singlestore, pgsql, sqlite, sqlsrv, firebird)"
    )]
    UnsupportedDriver(String),
    #[error("Invalid path ordering pattern: {0}")]
    InvalidPattern(String),
}

impl From<regex::Error> for GrammarError {
    fn from(e: regex::Error) -> Self {
        GrammarError::InvalidPattern(e.to_string())
    }
}
