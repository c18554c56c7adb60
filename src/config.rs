use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::hierarchy_catalog::HierarchySpec;
use crate::sql_grammar::Driver;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Compiler defaults shared by every spec compiled in one process
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Backend the SQL is compiled for (mysql, mariadb, singlestore, pgsql, sqlite,
    /// sqlsrv, firebird)
    #[validate(custom(function = "validate_driver"))]
    pub driver: String,

    /// Depth limit applied to specs that do not set their own
    #[validate(range(
        min = 1,
        max = 10000,
        message = "Default max depth must be between 1 and 10000"
    ))]
    pub default_max_depth: Option<u32>,

    /// Whether relation queries are ordered by their path
    pub natural_ordering: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            driver: Driver::Postgres.name().to_string(),
            default_max_depth: None,
            natural_ordering: false,
        }
    }
}

impl CompilerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            driver: env::var("ADJACENCY_DRIVER").unwrap_or_else(|_| "pgsql".to_string()),
            default_max_depth: parse_optional_env_var("ADJACENCY_MAX_DEPTH")?,
            natural_ordering: parse_env_var("ADJACENCY_NATURAL_ORDERING", "false")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            driver: cli.driver,
            default_max_depth: cli.max_depth,
            natural_ordering: cli.order_by_path,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Merge with another configuration (CLI overrides environment). Only a max depth
    /// that is set replaces the current one, and natural ordering can only be switched on.
    pub fn merge(&mut self, other: Self) {
        self.driver = other.driver;
        if other.default_max_depth.is_some() {
            self.default_max_depth = other.default_max_depth;
        }
        self.natural_ordering |= other.natural_ordering;
    }

    pub fn driver(&self) -> Result<Driver, ConfigError> {
        self.driver.parse().map_err(|e| ConfigError::Parse {
            field: "driver".to_string(),
            value: self.driver.clone(),
            source: Box::new(e),
        })
    }

    /// Fills in the defaults `spec` leaves open.
    pub fn apply(&self, mut spec: HierarchySpec) -> HierarchySpec {
        if spec.max_depth.is_none() {
            spec.max_depth = self.default_max_depth;
        }
        spec
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub driver: String,
    pub max_depth: Option<u32>,
    pub order_by_path: bool,
}

fn validate_driver(driver: &str) -> Result<(), ValidationError> {
    driver.parse::<Driver>().map(|_| ()).map_err(|_| {
        let mut error = ValidationError::new("unsupported_driver");
        error.message = Some(format!("Unsupported driver '{}'", driver).into());
        error
    })
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

/// Parse an environment variable that may be unset
fn parse_optional_env_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|e| ConfigError::Parse {
            field: key.to_string(),
            value,
            source: Box::new(e),
        }),
        Err(_) => Ok(None),
    }
}
