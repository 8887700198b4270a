mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use extract_core::config::load_dotenv;
use extract_core::Config;

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.log_summary();

    match args.command {
        Command::Validate { file } => {
            let report = commands::validate(&config, &file)?;
            if !report.is_valid {
                std::process::exit(1);
            }
        }
        Command::Preview { file, rows, force } => {
            commands::preview(&config, &file, rows, force).await?;
        }
        Command::Import { files } => {
            commands::import(&config, &files).await?;
        }
        Command::Profiles => commands::profiles(&config)?,
        Command::Fields {
            catalog,
            source_id,
            table,
            alias,
        } => {
            commands::fields(&catalog, &source_id, &table, &alias).await?;
        }
    }
    Ok(())
}
