//! Stockwatch Poller
//!
//! Watches a storefront's product feed for products of a given type and
//! price and emails the recipient when any show up.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Services: Feed fetching and SMTP delivery behind traits
//! - Scheduler: The check cycle, the polling loop and its backoff
//! - Lifecycle: Self-registration, the pid marker and signal handling
//!
//! With `--once` the poller performs a single check and exits without
//! touching the job registry.

mod config;
mod lifecycle;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use stockwatch_client::FeedClient;
use stockwatch_core::domain::job::JobSpec;
use stockwatch_core::marker::MarkerFile;
use stockwatch_core::registry::RegistryStore;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::lifecycle::ShutdownSignals;
use crate::scheduler::StockPoller;
use crate::service::{FeedSource, Notifier, SmtpNotifier};

#[derive(Parser)]
#[command(name = "stockwatch-poller")]
#[command(about = "Check a storefront feed for products and email matches", long_about = None)]
struct Args {
    /// Storefront identifier (e.g. waterwhendry)
    site: String,

    /// Product type to look for (e.g. Tee, Bottoms)
    product_type: String,

    /// Exact variant price as the feed spells it (e.g. 20.00)
    price: String,

    /// Email address to notify
    recipient: String,

    /// Run a single check and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stockwatch_poller=info,stockwatch_client=info,stockwatch_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(std::io::stdout().is_terminal()))
        .init();

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;

    let spec = JobSpec::new(args.site, args.product_type, args.price, args.recipient);

    let feed: Arc<dyn FeedSource> = Arc::new(FeedClient::new());
    let notifier: Arc<dyn Notifier> = Arc::new(SmtpNotifier::new(config.smtp.clone()));
    let poller = StockPoller::new(spec, &config, feed, notifier);

    if args.once {
        poller.check_once().await;
        return Ok(());
    }

    run_background(&poller, &config).await
}

/// Runs the polling loop until SIGTERM or SIGINT
async fn run_background(poller: &StockPoller, config: &Config) -> Result<()> {
    let spec = poller.spec();
    let mut signals = ShutdownSignals::install()?;

    // Removed on drop, so every exit path below cleans it up
    let mut marker = MarkerFile::for_job(&config.state_dir, &spec.key());
    marker
        .write_current()
        .context("Failed to write marker file")?;

    let store = RegistryStore::new(&config.state_dir);
    if let Err(e) = lifecycle::register_self(&store, spec) {
        warn!("{:#}", e);
    }

    tokio::select! {
        _ = poller.run() => {}
        name = signals.recv() => {
            info!("Received {}, terminating background job", name);
        }
    }

    marker.remove().context("Failed to remove marker file")?;
    info!("Poller for {} stopped", spec);
    Ok(())
}
