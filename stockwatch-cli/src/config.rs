//! Configuration module
//!
//! Handles controller configuration: where job state lives and which poller
//! executable to launch.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Name of the poller executable installed next to the controller
pub const POLLER_BIN_NAME: &str = "stockwatch-poller";

/// Controller configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the job registry, pid markers and poller logs
    pub state_dir: PathBuf,

    /// Poller executable to launch
    pub poller_bin: PathBuf,
}

impl Config {
    /// Builds the configuration, locating the poller next to the current
    /// executable unless one was given explicitly
    pub fn resolve(state_dir: PathBuf, poller_bin: Option<PathBuf>) -> Result<Self> {
        let poller_bin = match poller_bin {
            Some(path) => path,
            None => {
                let exe = std::env::current_exe().context("Failed to locate current executable")?;
                sibling_poller(&exe)
            }
        };

        Ok(Self {
            state_dir,
            poller_bin,
        })
    }
}

fn sibling_poller(exe: &Path) -> PathBuf {
    exe.with_file_name(POLLER_BIN_NAME)
}
