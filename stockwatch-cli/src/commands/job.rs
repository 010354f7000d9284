//! Job command handlers
//!
//! Runs controller operations and prints their status text.

use anyhow::Result;
use colored::*;
use stockwatch_core::domain::job::JobSpec;

use crate::config::Config;
use crate::controller::{JobController, JobOutcome, JobStatus};
use crate::process::OsProcessManager;

fn controller(config: &Config) -> JobController<OsProcessManager> {
    let processes = OsProcessManager::new(config.poller_bin.clone(), config.state_dir.clone());
    JobController::new(config.state_dir.clone(), processes)
}

/// Run one check in the foreground
pub async fn check(spec: &JobSpec, config: &Config) -> Result<()> {
    println!("{}", format!("Checking {}...", spec).bold());
    let output = controller(config).check_once(spec).await?;
    print!("{}", output);
    Ok(())
}

/// Start a background poller
pub fn submit(spec: &JobSpec, config: &Config) -> Result<()> {
    print_status(&controller(config).submit(spec)?);
    Ok(())
}

/// Stop a background poller
pub fn stop(spec: &JobSpec, config: &Config) -> Result<()> {
    print_status(&controller(config).stop(spec)?);
    Ok(())
}

/// List running jobs
pub fn list(config: &Config) -> Result<()> {
    let report = controller(config).list()?;
    let mut lines = report.lines();

    match lines.next() {
        Some(header) if header.starts_with("Running jobs") => {
            println!("{}", header.bold());
            for line in lines {
                println!("{}", line);
            }
        }
        Some(header) => println!("{}", header.yellow()),
        None => {}
    }
    Ok(())
}

fn print_status(status: &JobStatus) {
    let message = status.message.as_str();
    let line = match status.outcome {
        JobOutcome::Started | JobOutcome::Stopped => message.green(),
        JobOutcome::AlreadyRunning | JobOutcome::NotRunning | JobOutcome::NotFound => {
            message.yellow()
        }
        JobOutcome::SignalFailed => message.red(),
    };
    println!("{}", line);
}
