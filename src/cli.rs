//! Command-line argument parsing for pg-notebook.
//!
//! The binary plays the host: it registers the interpreters, builds one from
//! the config file plus `--property` overrides, and runs each query through
//! the interpreter's FIFO queue.

use crate::config::{Config, Properties};
use crate::error::{NotebookError, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// The raw payload, exactly as a notebook host would receive it.
    #[default]
    Text,
    /// One JSON object per query with code, message and error kind.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Run SQL paragraphs against PostgreSQL the way a notebook host would.
#[derive(Parser, Debug)]
#[command(name = "pg-notebook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Queries to run in order (use "-" or nothing to read one from stdin)
    #[arg(value_name = "QUERY")]
    pub queries: Vec<String>,

    /// Interpreter to run the queries with
    #[arg(short = 'i', long, value_name = "NAME", default_value = "postgresql")]
    pub interpreter: String,

    /// Interpreter property, e.g. --property=-h=db1 or --property=--user=alice (repeatable)
    #[arg(long = "property", value_name = "KEY=VALUE", allow_hyphen_values = true)]
    pub properties: Vec<String>,

    /// Fill missing connection properties from PGHOST, PGPORT, PGUSER, PGPASSWORD
    #[arg(long)]
    pub pg_env: bool,

    /// Command timeout in milliseconds (0 disables; overrides the config file)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Parses `--property KEY=VALUE` pairs.
    ///
    /// The split happens at the first `=`; keys may start with dashes.
    pub fn property_overrides(&self) -> Result<Properties> {
        self.properties
            .iter()
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
                _ => Err(NotebookError::config(format!(
                    "Invalid property '{pair}'. Expected KEY=VALUE"
                ))),
            })
            .collect()
    }

    /// Returns the queries to run, reading stdin when none (or "-") is given.
    pub fn resolve_queries(&self) -> Result<Vec<String>> {
        if self.queries.is_empty() || self.queries.iter().any(|q| q == "-") {
            let mut stdin = String::new();
            std::io::stdin()
                .read_to_string(&mut stdin)
                .map_err(|e| NotebookError::config(format!("Failed to read stdin: {e}")))?;

            if self.queries.is_empty() {
                return Ok(vec![stdin]);
            }
            return Ok(self
                .queries
                .iter()
                .map(|q| if q == "-" { stdin.clone() } else { q.clone() })
                .collect());
        }
        Ok(self.queries.clone())
    }
}
