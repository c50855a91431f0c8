//! oxide-query CLI
//!
//! Translates search strings, condition trees and projections into SQL.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

use oxide_query_core::dialect::dialect_for;
use oxide_query_core::{Condition, Projection, QueryTranslator, Schema};

/// Translate search strings and condition trees into parameterized SQL.
#[derive(Parser)]
#[command(name = "oxide-query")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file mapping field names to `{"type": .., "isAny": ..}`.
    #[arg(short, long, env = "OXIDE_QUERY_SCHEMA")]
    schema: Option<PathBuf>,

    /// SQL dialect.
    #[arg(short, long, default_value = "sqlite")]
    dialect: String,

    /// Reject fields that are not declared in the schema.
    #[arg(long)]
    strict: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a search string such as `name:john -age>30`.
    Search {
        /// The search string.
        query: String,
    },

    /// Translate a JSON condition tree.
    Condition {
        /// The condition tree as JSON.
        json: String,
    },

    /// Format a JSON projection (`{"field": 1, ..}`) as a column list.
    Select {
        /// The projection as JSON.
        json: String,
    },
}

fn load_schema(path: Option<&PathBuf>) -> anyhow::Result<Schema> {
    let Some(path) = path else {
        return Ok(Schema::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    let schema: Schema = serde_json::from_str(&text)
        .with_context(|| format!("parsing schema {}", path.display()))?;
    debug!("Loaded {} schema fields from {}", schema.len(), path.display());
    Ok(schema)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(dialect) = dialect_for(&cli.dialect) else {
        bail!("unsupported dialect: {}", cli.dialect);
    };
    let schema = load_schema(cli.schema.as_ref())?;
    let translator = QueryTranslator::new(schema)
        .with_dialect(dialect)
        .with_strict(cli.strict);

    let output = match cli.command {
        Commands::Search { query } => serde_json::to_value(translator.parse(query)?)?,
        Commands::Condition { json } => {
            let tree = Condition::from_json_str(&json)?;
            serde_json::to_value(translator.parse(tree)?)?
        }
        Commands::Select { json } => {
            let value: Value = serde_json::from_str(&json)?;
            let projection = Projection::from_json(&value)?;
            json!({ "columns": translator.select(&projection) })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
