//! Job registry
//!
//! The registry maps each job key to the process running it. It lives in a
//! single JSON file that is loaded whole and rewritten whole on every
//! mutation. Read-modify-write cycles hold an exclusive advisory lock on a
//! sidecar `.lock` file, and rewrites go through a temporary file and a
//! rename.
//!
//! Entries whose process has died are not removed here; callers prune them
//! when they next look at the registry.

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::job::{JobKey, JobRecord};
use crate::error::{Result, StoreError};

/// File name of the registry inside the state directory
pub const REGISTRY_FILE: &str = "running_jobs.json";

/// In-memory view of the registry file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    jobs: BTreeMap<JobKey, JobRecord>,
}

impl Registry {
    pub fn get(&self, key: &JobKey) -> Option<&JobRecord> {
        self.jobs.get(key)
    }

    /// Records a job, replacing any previous entry for the key
    pub fn insert(&mut self, key: JobKey, record: JobRecord) -> Option<JobRecord> {
        self.jobs.insert(key, record)
    }

    pub fn remove(&mut self, key: &JobKey) -> Option<JobRecord> {
        self.jobs.remove(key)
    }

    /// Keeps only the entries for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&JobKey, &JobRecord) -> bool) {
        self.jobs.retain(|k, v| keep(k, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JobKey, &JobRecord)> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// File-backed registry store
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Creates a store for the registry file inside `state_dir`
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self::at(state_dir.as_ref().join(REGISTRY_FILE))
    }

    /// Creates a store for an explicit registry file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    /// Loads the registry
    ///
    /// A missing file is an empty registry. So is a corrupt one, with a
    /// warning, so that a damaged file never blocks job control.
    pub fn load(&self) -> Result<Registry> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No registry at {}, starting empty", self.path.display());
                return Ok(Registry::default());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        match serde_json::from_str(&contents) {
            Ok(registry) => Ok(registry),
            Err(e) => {
                warn!(
                    "Ignoring unreadable registry {}: {}",
                    self.path.display(),
                    e
                );
                Ok(Registry::default())
            }
        }
    }

    /// Rewrites the registry file with the given contents
    pub fn save(&self, registry: &Registry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(registry)?;
        let tmp = sibling(&self.path, "tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        debug!(
            "Saved registry with {} job(s) to {}",
            registry.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Runs a locked read-modify-write cycle
    ///
    /// The registry is loaded, handed to `mutate`, and saved back before the
    /// lock is released. Whatever `mutate` returns is passed through.
    pub fn update<T>(&self, mutate: impl FnOnce(&mut Registry) -> T) -> Result<T> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::io(&lock_path, e))?;
        lock.lock_exclusive()
            .map_err(|e| StoreError::io(&lock_path, e))?;

        let mut registry = self.load()?;
        let output = mutate(&mut registry);
        self.save(&registry)?;

        // Closing the lock file releases the lock
        drop(lock);
        Ok(output)
    }
}

/// `running_jobs.json` -> `running_jobs.json.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::JobSpec;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(pid: u32, product_type: &str) -> (JobKey, JobRecord) {
        let spec = JobSpec::new("waterwhendry", product_type, "20.00", "me@example.com");
        (
            spec.key(),
            JobRecord {
                pid,
                spec,
                started_at: Utc::now(),
            },
        )
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path());
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path());

        let mut registry = Registry::default();
        let (key, rec) = record(100, "Tee");
        registry.insert(key.clone(), rec.clone());
        store.save(&registry).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.get(&key), Some(&rec));
        assert!(!dir.path().join("running_jobs.json.tmp").exists());
    }

    #[test]
    fn test_file_is_keyed_object() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path());
        let (key, rec) = record(7, "Tee");
        store
            .update(|r| {
                r.insert(key, rec);
            })
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["waterwhendry_Tee_20.00_me@example.com"]["pid"], 7);
    }

    #[test]
    fn test_update_persists_and_returns() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path());
        let (tee_key, tee) = record(1, "Tee");
        let (bottoms_key, bottoms) = record(2, "Bottoms");

        store
            .update(|r| {
                r.insert(tee_key.clone(), tee);
                r.insert(bottoms_key.clone(), bottoms);
            })
            .unwrap();

        let removed = store.update(|r| r.remove(&tee_key)).unwrap();
        assert_eq!(removed.map(|r| r.pid), Some(1));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(&bottoms_key).is_some());
    }

    #[test]
    fn test_retain_prunes() {
        let mut registry = Registry::default();
        for (pid, t) in [(1, "A"), (2, "B"), (3, "C")] {
            let (k, r) = record(pid, t);
            registry.insert(k, r);
        }
        registry.retain(|_, r| r.pid != 2);
        let pids: Vec<u32> = registry.iter().map(|(_, r)| r.pid).collect();
        assert_eq!(pids, vec![1, 3]);
    }

    #[test]
    fn test_creates_state_dir() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path().join("nested/state"));
        store.update(|_| ()).unwrap();
        assert!(store.path().exists());
    }
}
