//! Persistence of the previous run's keyword counts.
//!
//! The snapshot is a single JSON object mapping keyword to count, read once
//! before trend classification and overwritten in full after it. There is
//! exactly one writer per run, so no locking is involved.
//!
//! # Architecture
//!
//! - [`SnapshotStore`]: load/save interface the pipeline depends on
//! - [`JsonFileStore`]: the on-disk store used in production
//! - `MemoryStore`: an in-process store for tests

use crate::models::Snapshot;
use crate::utils::looks_truncated;
use std::error::Error;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;
use tracing::{info, instrument, warn};

/// A single-record key-value store holding the baseline snapshot.
pub trait SnapshotStore {
    /// Return the stored snapshot.
    ///
    /// A missing or unreadable snapshot is not an error: it yields an empty
    /// mapping, which the trend classifier treats as a cold start.
    fn load(&self) -> Snapshot;

    /// Replace the stored snapshot with `snapshot`.
    fn save(&self, snapshot: &Snapshot) -> Result<(), Box<dyn Error>>;
}

/// Snapshot stored as a JSON file.
///
/// Saves go through a sibling temporary file and a rename, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    fn load(&self) -> Snapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No snapshot yet; starting without a baseline");
                return Snapshot::new();
            }
            Err(e) => {
                warn!(error = %e, "Could not read snapshot; starting without a baseline");
                return Snapshot::new();
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => {
                info!(keywords = snapshot.len(), "Loaded snapshot");
                snapshot
            }
            Err(e) => {
                warn!(
                    error = %e,
                    truncated = looks_truncated(&e),
                    "Malformed snapshot; starting without a baseline"
                );
                Snapshot::new()
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), keywords = snapshot.len()))]
    fn save(&self, snapshot: &Snapshot) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!("Saved snapshot");
        Ok(())
    }
}

/// Snapshot kept in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(initial),
        }
    }

    /// A copy of the current contents.
    pub fn current(&self) -> Snapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl SnapshotStore for MemoryStore {
    fn load(&self) -> Snapshot {
        self.current()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), Box<dyn Error>> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| "snapshot lock poisoned")?;
        *guard = snapshot.clone();
        Ok(())
    }
}
