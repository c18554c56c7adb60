use std::path::PathBuf;

use adjacency_cte::config::{CliConfig, CompilerConfig};
use adjacency_cte::hierarchy_catalog::HierarchySpec;
use adjacency_cte::recursive_query::{RecursiveQueryBuilder, RelatedTable, RelationKind};
use adjacency_cte::render_plan::{Binding, Statement};
use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;

/// adjacency-cte - compile hierarchy queries into recursive CTEs
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Hierarchy spec (YAML)
    #[arg(long)]
    spec: PathBuf,

    /// Compiler config (YAML); ADJACENCY_* environment variables apply first
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target backend: mysql, mariadb, singlestore, pgsql, sqlite, sqlsrv, firebird
    #[arg(long)]
    driver: Option<String>,

    /// Relation to load
    #[arg(long, default_value = "descendants")]
    relation: RelationKind,

    /// Start key, repeatable
    #[arg(long = "key")]
    keys: Vec<String>,

    /// Depth limit for specs without one
    #[arg(long)]
    max_depth: Option<u32>,

    /// Batch the keys into one query with path lists
    #[arg(long)]
    batch: bool,

    /// Related table loaded by a batch query
    #[arg(long, requires = "foreign_key")]
    related_table: Option<String>,

    /// Column of the related table referencing the hierarchy key
    #[arg(long, requires = "related_table")]
    foreign_key: Option<String>,

    /// Compile an EXISTS subquery correlated with this outer table instead
    #[arg(long, conflicts_with = "batch")]
    existence: Option<String>,

    /// Aggregate selected by the existence subquery, written against the hierarchy table
    #[arg(long, requires = "existence")]
    aggregate: Option<String>,

    /// Order relation rows by path
    #[arg(long)]
    order_by_path: bool,
}

fn parse_key(key: &str) -> Binding {
    match key.parse::<i64>() {
        Ok(number) => json!(number),
        Err(_) => json!(key),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<CompilerConfig> {
    let mut config = CompilerConfig::from_env().context("invalid ADJACENCY_* environment")?;
    if let Some(path) = &cli.config {
        let file = CompilerConfig::from_yaml_file(path)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.merge(file);
    }

    let overrides = CompilerConfig::from_cli(CliConfig {
        driver: cli.driver.clone().unwrap_or_else(|| config.driver.clone()),
        max_depth: cli.max_depth,
        order_by_path: cli.order_by_path,
    })?;
    config.merge(overrides);
    Ok(config)
}

fn compile(cli: &Cli, config: &CompilerConfig) -> anyhow::Result<Statement> {
    let spec = HierarchySpec::from_yaml_file(&cli.spec)
        .with_context(|| format!("invalid hierarchy spec {}", cli.spec.display()))?;
    let builder = RecursiveQueryBuilder::for_driver(config.apply(spec), config.driver()?)?;
    let keys: Vec<Binding> = cli.keys.iter().map(|key| parse_key(key)).collect();

    if let Some(outer_table) = &cli.existence {
        let existence = builder.compile_existence(outer_table, cli.aggregate.as_deref())?;
        let fragment = match cli.aggregate {
            Some(_) => existence.scalar(),
            None => existence.exists(),
        };
        return Ok(Statement {
            sql: fragment.sql,
            bindings: fragment.bindings,
        });
    }

    if keys.is_empty() && cli.relation != RelationKind::Tree {
        bail!("--key is required for the {} relation", cli.relation);
    }

    let mut query = if cli.batch {
        let related = match (&cli.related_table, &cli.foreign_key) {
            (Some(table), Some(foreign_key)) => Some(RelatedTable::new(table, foreign_key)),
            _ => None,
        };
        builder.compile_batch(cli.relation, &keys, related.as_ref())?
    } else {
        builder.compile_relation(cli.relation, &keys)?
    };
    if config.natural_ordering && !cli.batch {
        query.add_order_by(builder.order_by_path_expression());
    }
    Ok(query.to_statement())
}

fn main() -> anyhow::Result<()> {
    // Initialize logger - defaults to WARN level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let statement = compile(&cli, &config)?;

    println!("{}", serde_json::to_string_pretty(&statement)?);
    Ok(())
}
