//! File-backed run-cycle counters.
//!
//! Stored as a two-field JSON object, `{"ac1":12,"ac2":34}`.  Writes go to
//! a sibling temp file that is renamed over the target, so a power cut
//! leaves either the old or the new counters, never half a file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::CounterStore;
use crate::app::state::RunCounters;
use crate::error::StorageError;

pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CounterStore for FileCounterStore {
    /// A missing file reads as zeros, and a zeroed file is created.
    fn load(&mut self) -> Result<RunCounters, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let counters: RunCounters = serde_json::from_str(&text).map_err(|e| {
                    warn!("WARNING: counters file {} unreadable: {e}", self.path.display());
                    StorageError::Corrupted
                })?;
                info!(
                    "INFO: read run counters AC1={} AC2={}",
                    counters.ac1, counters.ac2
                );
                Ok(counters)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let zero = RunCounters::default();
                info!("INFO: no counters file, starting from zero");
                if let Err(e) = self.save(&zero) {
                    warn!("WARNING: could not create counters file: {e}");
                }
                Ok(zero)
            }
            Err(e) => {
                warn!("WARNING: counters file {}: {e}", self.path.display());
                Err(StorageError::Io)
            }
        }
    }

    fn save(&mut self, counters: &RunCounters) -> Result<(), StorageError> {
        let json = serde_json::to_string(counters).map_err(|_| StorageError::Corrupted)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|_| StorageError::Io)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|_| StorageError::Io)?;
        fs::rename(&tmp, &self.path).map_err(|_| StorageError::Io)
    }
}
