//! Poller processes
//!
//! Starting, probing and signalling poller processes. The controller only
//! talks to processes through [`ProcessManager`], so its bookkeeping can be
//! tested without spawning anything.

use anyhow::{Context, Result};
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fs::{self, OpenOptions};
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use stockwatch_core::domain::job::JobSpec;
use tracing::debug;

/// Directory holding per-job poller logs inside the state directory
pub const LOG_DIR: &str = "logs";

/// What happened when a poller was asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGTERM was delivered
    Signalled,
    /// No such process
    NotFound,
}

/// Operations the controller needs on poller processes
#[async_trait]
pub trait ProcessManager: Send + Sync {
    /// Starts a detached poller for the job and returns its pid
    fn spawn_detached(&self, spec: &JobSpec) -> Result<u32>;

    /// Runs a single-shot poller to completion and returns its output
    async fn run_once(&self, spec: &JobSpec) -> Result<String>;

    /// Whether a process with this pid exists
    fn is_alive(&self, pid: u32) -> bool;

    /// Sends SIGTERM to the process
    fn terminate(&self, pid: u32) -> Result<Termination>;
}

/// ProcessManager backed by real OS processes
pub struct OsProcessManager {
    poller_bin: PathBuf,
    state_dir: PathBuf,
}

impl OsProcessManager {
    pub fn new(poller_bin: PathBuf, state_dir: PathBuf) -> Self {
        Self {
            poller_bin,
            state_dir,
        }
    }

    fn poller_args(spec: &JobSpec) -> [&str; 4] {
        [
            spec.site.as_str(),
            spec.product_type.as_str(),
            spec.price.as_str(),
            spec.recipient.as_str(),
        ]
    }

    fn log_path(&self, spec: &JobSpec) -> PathBuf {
        self.state_dir
            .join(LOG_DIR)
            .join(format!("{}.log", spec.key().as_str()))
    }
}

#[async_trait]
impl ProcessManager for OsProcessManager {
    fn spawn_detached(&self, spec: &JobSpec) -> Result<u32> {
        let log_path = self.log_path(spec);
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open {}", log_path.display()))?;
        let log_err = log.try_clone().context("Failed to duplicate log handle")?;

        // Own process group, so the poller outlives the controller and
        // ignores a Ctrl-C aimed at it
        let child = Command::new(&self.poller_bin)
            .args(Self::poller_args(spec))
            .env("STOCKWATCH_STATE_DIR", &self.state_dir)
            .stdin(Stdio::null())
            .stdout(log)
            .stderr(log_err)
            .process_group(0)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.poller_bin.display()))?;

        let pid = child.id();
        debug!("Spawned poller {} logging to {}", pid, log_path.display());
        Ok(pid)
    }

    async fn run_once(&self, spec: &JobSpec) -> Result<String> {
        let output = tokio::process::Command::new(&self.poller_bin)
            .args(Self::poller_args(spec))
            .arg("--once")
            .env("STOCKWATCH_STATE_DIR", &self.state_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.poller_bin.display()))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if !output.status.success() {
            text.push_str(&format!("Poller exited with {}\n", output.status));
        }
        Ok(text)
    }

    fn is_alive(&self, pid: u32) -> bool {
        let Some(pid) = to_pid(pid) else {
            return false;
        };

        // Signal 0 only checks for existence; EPERM means it exists but
        // belongs to someone else
        match kill(pid, None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    fn terminate(&self, pid: u32) -> Result<Termination> {
        let Some(nix_pid) = to_pid(pid) else {
            return Ok(Termination::NotFound);
        };

        match kill(nix_pid, Signal::SIGTERM) {
            Ok(()) => Ok(Termination::Signalled),
            Err(Errno::ESRCH) => Ok(Termination::NotFound),
            Err(e) => Err(e).with_context(|| format!("Failed to signal PID {}", pid)),
        }
    }
}

/// Rejects pids that `kill` would treat as process groups
fn to_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .map(Pid::from_raw)
}
