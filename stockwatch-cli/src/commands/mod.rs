//! Commands module
//!
//! Defines the CLI commands and routes them to their handlers.

mod job;

use anyhow::Result;
use clap::{Args, Subcommand};
use stockwatch_core::domain::job::JobSpec;
use stockwatch_core::domain::site::Site;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a single check in the foreground and print the result
    Check(JobArgs),
    /// Start a background poller for the job
    Submit(JobArgs),
    /// Stop the background poller for the job
    Stop(JobArgs),
    /// List running jobs
    List,
}

/// Parameters identifying a job
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Site to watch
    #[arg(long, default_value = "waterwhendry")]
    pub site: Site,

    /// Product type to match exactly
    #[arg(long, default_value = "Tee")]
    pub product_type: String,

    /// Variant price to match exactly
    #[arg(long, default_value = "20.00")]
    pub price: String,

    /// Email address to notify
    #[arg(long, env = "STOCKWATCH_RECIPIENT")]
    pub recipient: String,
}

impl JobArgs {
    pub fn spec(&self) -> JobSpec {
        JobSpec::new(
            self.site.id(),
            self.product_type.as_str(),
            self.price.as_str(),
            self.recipient.as_str(),
        )
    }
}

/// Handle a CLI command
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Check(args) => job::check(&args.spec(), config).await,
        Commands::Submit(args) => job::submit(&args.spec(), config),
        Commands::Stop(args) => job::stop(&args.spec(), config),
        Commands::List => job::list(config),
    }
}
