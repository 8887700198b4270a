use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Validate and preview extract query definitions.
///
/// Query files are JSON or YAML documents in the query builder's wire
/// format. Results are printed to stdout as JSON.
#[derive(Parser, Debug)]
#[command(name = "extract-query", version, about)]
pub struct CliArgs {
    /// Config profile (overrides EXTRACT_PROFILE)
    #[arg(long, env = "EXTRACT_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the validation rules and print the report.
    /// Exits with status 1 when the query has errors.
    Validate {
        /// Query definition (.json, .yml, .yaml)
        file: PathBuf,
    },

    /// Validate, then print a synthetic preview of the query.
    Preview {
        /// Query definition (.json, .yml, .yaml)
        file: PathBuf,

        /// Number of sample rows (overrides PREVIEW_ROW_COUNT)
        #[arg(long)]
        rows: Option<usize>,

        /// Preview even when validation reports errors
        #[arg(long)]
        force: bool,
    },

    /// Load query files into an in-memory store under the configured
    /// store policy and list what it kept.
    Import {
        /// Query definitions (.json, .yml, .yaml)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List config profiles found in the environment and the active settings.
    Profiles,

    /// Resolve the fields a registered source exposes for a table.
    Fields {
        /// JSON array of registered data sources
        #[arg(long, env = "EXTRACT_CATALOG")]
        catalog: PathBuf,

        /// Data source id
        #[arg(long)]
        source_id: String,

        /// Table name (case-insensitive)
        #[arg(long)]
        table: String,

        /// Query alias to scope the fields to
        #[arg(long, default_value = "s1")]
        alias: String,
    },
}
