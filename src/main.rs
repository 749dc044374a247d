//! FoodData Central sync tool
//!
//! Looks up foods in a local FoodData Central sqlite export and uploads them
//! to the remote food database as one create-or-replace batch.

// fdcsync/src/main.rs
mod config;
mod errors;
mod models;
mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use config::SyncOptions;
use sync::UploadOutcome;

const DEFAULT_LOG_FILTER: &str = "fdcsync=info";

#[derive(Parser, Debug)]
#[command(name = "fdcsync")]
#[command(about = "Sync FoodData Central foods to the remote food database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Adds (or overwrites) foods in the remote food database
    Add(SyncOptions),
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env values must be in the environment before clap reads env fallbacks.
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("❌ Error: {:?}", e);
        return ExitCode::FAILURE;
    }

    match run_app(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}

async fn run_app(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Add(options) => {
            let report = sync::run_sync_flow(options).await?;
            let summary = match &report.upload {
                UploadOutcome::Uploaded(count) => format!("uploaded {}", count),
                UploadOutcome::Skipped => "nothing uploaded".to_string(),
                UploadOutcome::DryRun => "dry run, nothing uploaded".to_string(),
                UploadOutcome::Failed(_) => "upload failed".to_string(),
            };
            tracing::info!(
                "Assembled {} of {} requested foods, {}.",
                report.assembled,
                report.requested,
                summary
            );
        }
    }
    Ok(())
}
