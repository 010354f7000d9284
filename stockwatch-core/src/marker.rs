//! Per-job pid marker files
//!
//! A running poller writes its own pid to `pids/<job key>.pid` under the
//! state directory and removes the file when it exits. Markers are keyed by
//! job, so pollers for different jobs never touch each other's marker.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::domain::job::JobKey;
use crate::error::{Result, StoreError};

/// Directory holding marker files inside the state directory
pub const MARKER_DIR: &str = "pids";

/// Pid marker for a single job
#[derive(Debug)]
pub struct MarkerFile {
    path: PathBuf,
    owned: bool,
}

impl MarkerFile {
    /// Marker location for the given job
    pub fn for_job(state_dir: impl AsRef<Path>, key: &JobKey) -> Self {
        let path = state_dir
            .as_ref()
            .join(MARKER_DIR)
            .join(format!("{}.pid", key.as_str()));
        Self { path, owned: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current process id and takes ownership of the marker
    ///
    /// An owned marker is removed when it is dropped.
    pub fn write_current(&mut self) -> Result<()> {
        let pid = std::process::id();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        writeln!(file, "{}", pid).map_err(|e| StoreError::io(&self.path, e))?;

        self.owned = true;
        info!("Marker file written: {} (PID: {})", self.path.display(), pid);
        Ok(())
    }

    /// Removes the marker if present
    pub fn remove(&mut self) -> Result<()> {
        self.owned = false;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Marker file removed: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

impl Drop for MarkerFile {
    fn drop(&mut self) {
        if self.owned {
            if let Err(e) = self.remove() {
                warn!("Failed to remove marker file on exit: {}", e);
            }
        }
    }
}
