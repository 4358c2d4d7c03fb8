//! Stash - operator CLI
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stash list` | Print declared caches with engine and default expiry |
//! | `stash check` | Connect every declared cache; exit 1 if any fails |

use anyhow::Context;
use clap::{Parser, Subcommand};
use stash::{CacheRegistry, ConfigLoader};
use stash::cli;
use stash::infrastructure::logging::init_logging;
use std::process::ExitCode;

/// Command line interface for Stash
#[derive(Parser, Debug)]
#[command(name = "stash")]
#[command(about = "Stash - inspect and check configured caches")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operator commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List declared caches
    List,
    /// Connect every declared cache and report READY or the failure
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    let config = loader.load().context("Failed to load configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;

    let registry = CacheRegistry::from_config(&config).context("Failed to register caches")?;

    match args.command {
        Command::List => {
            for summary in cli::list(&registry) {
                println!("{summary}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => {
            let reports = cli::check(&registry).await;
            for report in &reports {
                println!("{report}");
            }
            if reports.iter().all(cli::CheckReport::is_ready) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
