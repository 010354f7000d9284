//! Process lifecycle
//!
//! A continuous poller registers itself in the job registry, keeps a keyed
//! pid marker for as long as it runs, and shuts down cleanly on SIGTERM or
//! SIGINT.

use anyhow::{Context, Result};
use chrono::Utc;
use stockwatch_core::domain::job::{JobRecord, JobSpec};
use stockwatch_core::registry::RegistryStore;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::info;

/// Records this process as the runner of `spec`
///
/// Overwrites whatever entry the key had. When the controller spawned this
/// process it has already recorded the same pid, so this is a no-op change;
/// when the poller is started by hand it makes the job visible to the
/// controller.
pub fn register_self(store: &RegistryStore, spec: &JobSpec) -> Result<()> {
    let pid = std::process::id();
    let record = JobRecord {
        pid,
        spec: spec.clone(),
        started_at: Utc::now(),
    };

    store
        .update(|registry| registry.insert(spec.key(), record))
        .with_context(|| format!("Failed to register in {}", store.path().display()))?;

    info!("Registered job {} (PID: {})", spec.key(), pid);
    Ok(())
}

/// Termination signals the poller honours
pub struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

impl ShutdownSignals {
    /// Installs the SIGTERM and SIGINT handlers
    pub fn install() -> Result<Self> {
        let sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        let sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

        info!("Signal handlers installed (SIGTERM, SIGINT)");
        Ok(Self { sigterm, sigint })
    }

    /// Waits for the first termination signal and returns its name
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_register_self_records_own_pid() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path());
        let spec = JobSpec::new("waterwhendry", "Tee", "20.00", "me@example.com");

        register_self(&store, &spec).unwrap();

        let registry = store.load().unwrap();
        let record = registry.get(&spec.key()).unwrap();
        assert_eq!(record.pid, std::process::id());
        assert_eq!(record.spec, spec);
    }

    #[test]
    fn test_register_self_replaces_stale_entry() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path());
        let spec = JobSpec::new("waterwhendry", "Tee", "20.00", "me@example.com");
        store
            .update(|r| {
                r.insert(
                    spec.key(),
                    JobRecord {
                        pid: 1,
                        spec: spec.clone(),
                        started_at: Utc::now(),
                    },
                )
            })
            .unwrap();

        register_self(&store, &spec).unwrap();

        let registry = store.load().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&spec.key()).unwrap().pid, std::process::id());
    }
}
