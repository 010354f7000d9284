//! Stockwatch CLI
//!
//! Starts, stops and lists stock pollers, or runs a single check in the
//! foreground.

mod commands;
mod config;
mod controller;
mod process;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stockwatch")]
#[command(about = "Product stock watcher", long_about = None)]
struct Cli {
    /// Directory holding the job registry, pid markers and poller logs
    #[arg(long, env = "STOCKWATCH_STATE_DIR", default_value = ".")]
    state_dir: PathBuf,

    /// Poller executable (defaults to stockwatch-poller next to this binary)
    #[arg(long, env = "STOCKWATCH_POLLER_BIN")]
    poller_bin: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries status text only
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockwatch=warn,stockwatch_core=warn".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.state_dir, cli.poller_bin)?;

    handle_command(cli.command, &config).await
}
