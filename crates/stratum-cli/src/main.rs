use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stratum_config::ConfigLoader;
use stratum_core::Upgrader;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stratum", version, about = "Versioned SQLite schema migrations")]
struct Cli {
    /// Path to a YAML or TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the database path.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Override the migrations directory.
    #[arg(long, global = true)]
    migrations: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply all pending migrations.
    Upgrade {
        /// Print the upgrade report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the current schema version and pending migrations.
    Status {
        /// Print the status as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config =
        ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    if let Some(migrations) = cli.migrations {
        config.migrations.dir = migrations;
    }

    let upgrader = Upgrader::new(&config);

    match cli.command {
        Command::Upgrade { json } => {
            let report = if json {
                upgrader.upgrade()?
            } else {
                upgrader.upgrade_with(|version| {
                    println!("applied migration {version}");
                    Ok(())
                })?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.applied.is_empty() {
                println!("schema already up to date at version {}", report.to_version);
            } else {
                println!(
                    "schema upgraded from version {} to {} ({} applied)",
                    report.from_version,
                    report.to_version,
                    report.applied.len()
                );
            }
        }
        Command::Status { json } => {
            let status = upgrader.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("current version: {}", status.current_version);
                if let Some(at) = status.updated_at {
                    println!("last migrated:   {at}");
                }
                if status.pending.is_empty() {
                    println!("pending:         none");
                } else {
                    let versions: Vec<String> =
                        status.pending.iter().map(|v| v.to_string()).collect();
                    println!("pending:         {}", versions.join(", "));
                }
            }
        }
    }

    Ok(())
}
