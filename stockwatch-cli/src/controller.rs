//! Job controller
//!
//! Check, submit, stop and list polling jobs. Every operation returns a
//! human-readable status line. Registry entries whose process has died are
//! pruned whenever submit, stop or list looks at the registry.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use stockwatch_core::domain::job::{JobRecord, JobSpec};
use stockwatch_core::marker::MarkerFile;
use stockwatch_core::registry::{Registry, RegistryStore};
use tracing::{info, warn};

use crate::process::{ProcessManager, Termination};

/// What a submit or stop did to the job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Started,
    AlreadyRunning,
    Stopped,
    NotRunning,
    NotFound,
    /// Entry removed, but the process could not be signalled
    SignalFailed,
}

/// Outcome of a controller operation plus its status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub outcome: JobOutcome,
    pub message: String,
}

impl JobStatus {
    fn new(outcome: JobOutcome, message: String) -> Self {
        Self { outcome, message }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Manages polling jobs through the registry in a state directory
pub struct JobController<P> {
    state_dir: PathBuf,
    store: RegistryStore,
    processes: P,
}

impl<P: ProcessManager> JobController<P> {
    pub fn new(state_dir: PathBuf, processes: P) -> Self {
        let store = RegistryStore::new(&state_dir);
        Self {
            state_dir,
            store,
            processes,
        }
    }

    /// Runs the poller once in the foreground and returns its output
    ///
    /// The registry is not touched.
    pub async fn check_once(&self, spec: &JobSpec) -> Result<String> {
        self.processes.run_once(spec).await
    }

    /// Starts a background poller unless one is already running for the job
    pub fn submit(&self, spec: &JobSpec) -> Result<JobStatus> {
        let key = spec.key();

        self.store
            .update(|registry| -> Result<JobStatus> {
                self.prune_dead(registry);

                if let Some(existing) = registry.get(&key) {
                    return Ok(JobStatus::new(
                        JobOutcome::AlreadyRunning,
                        format!("Job already running for {} (PID: {})", spec, existing.pid),
                    ));
                }

                let pid = self.processes.spawn_detached(spec)?;
                registry.insert(
                    key.clone(),
                    JobRecord {
                        pid,
                        spec: spec.clone(),
                        started_at: Utc::now(),
                    },
                );

                info!("Started job {} (PID: {})", key, pid);
                Ok(JobStatus::new(
                    JobOutcome::Started,
                    format!("Started background job for {} (PID: {})", spec, pid),
                ))
            })
            .context("Failed to update job registry")?
    }

    /// Stops the background poller recorded for the job
    ///
    /// The entry is removed whether or not the process was still there.
    pub fn stop(&self, spec: &JobSpec) -> Result<JobStatus> {
        let key = spec.key();

        let removed = self
            .store
            .update(|registry| {
                let removed = registry.remove(&key);
                self.prune_dead(registry);
                removed
            })
            .context("Failed to update job registry")?;

        let Some(record) = removed else {
            return Ok(JobStatus::new(
                JobOutcome::NotFound,
                format!("No running job found for {}", spec),
            ));
        };

        let status = match self.processes.terminate(record.pid) {
            Ok(Termination::Signalled) => {
                info!("Sent SIGTERM to job {} (PID: {})", key, record.pid);
                JobStatus::new(
                    JobOutcome::Stopped,
                    format!("Stopped job for {} (PID: {})", spec, record.pid),
                )
            }
            Ok(Termination::NotFound) => JobStatus::new(
                JobOutcome::NotRunning,
                format!("Job for {} was not running (PID: {})", spec, record.pid),
            ),
            Err(e) => {
                warn!("{:#}", e);
                JobStatus::new(
                    JobOutcome::SignalFailed,
                    format!(
                        "Removed job for {} but could not signal PID {}: {:#}",
                        spec, record.pid, e
                    ),
                )
            }
        };

        // The poller removes its own marker on SIGTERM; this covers pollers
        // that died without cleaning up
        let mut marker = MarkerFile::for_job(&self.state_dir, &key);
        if let Err(e) = marker.remove() {
            warn!("{}", e);
        }

        Ok(status)
    }

    /// Lists running jobs, pruning and persisting away dead ones
    pub fn list(&self) -> Result<String> {
        let running: Vec<JobRecord> = self
            .store
            .update(|registry| {
                self.prune_dead(registry);
                registry
                    .iter()
                    .map(|(_, record)| record.clone())
                    .collect::<Vec<_>>()
            })
            .context("Failed to update job registry")?;

        if running.is_empty() {
            return Ok("No jobs are currently running.".to_string());
        }

        let mut report = String::from("Running jobs:\n");
        for record in &running {
            report.push_str(&format!("- {} (PID: {})\n", record.spec, record.pid));
        }
        Ok(report)
    }

    fn prune_dead(&self, registry: &mut Registry) {
        registry.retain(|key, record| {
            let alive = self.processes.is_alive(record.pid);
            if !alive {
                info!("Pruning job {} (PID {} is gone)", key, record.pid);
            }
            alive
        });
    }
}
