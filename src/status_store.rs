use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::utils::error::Result;

/// Last known availability per product key.
pub type StatusMap = BTreeMap<String, bool>;

/// JSON file holding the previous run's availability flags.
///
/// Reads never fail: a missing or unreadable file counts as "nothing was
/// available last time". Writes overwrite the file; a failed write is logged
/// and reported, not propagated. There is no locking, so overlapping runs
/// race on the file.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> StatusMap {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<StatusMap>(&contents) {
                Ok(map) => {
                    tracing::debug!("Loaded {} previous statuses from {}", map.len(), self.path.display());
                    map
                }
                Err(e) => {
                    tracing::warn!("Ignoring unreadable status file {}: {}", self.path.display(), e);
                    StatusMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No previous status file at {}", self.path.display());
                StatusMap::new()
            }
            Err(e) => {
                tracing::warn!("Could not read status file {}: {}", self.path.display(), e);
                StatusMap::new()
            }
        }
    }

    /// Overwrite the status file. Returns whether the write succeeded.
    pub fn save(&self, statuses: &StatusMap) -> bool {
        match self.write(statuses) {
            Ok(()) => {
                tracing::debug!("Saved {} statuses to {}", statuses.len(), self.path.display());
                true
            }
            Err(e) => {
                tracing::error!("Error saving status to {}: {}", self.path.display(), e);
                false
            }
        }
    }

    fn write(&self, statuses: &StatusMap) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(statuses)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
