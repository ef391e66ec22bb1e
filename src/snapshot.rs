//! Snapshot persistence
//!
//! A snapshot is a point-in-time copy of the full parameter set, stored
//! under an incrementing numeric id. Backends are called by the controller
//! outside the store lock.

use crate::codec::{CodecError, ParameterCodec};
use crate::parameters::Parameter;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type SnapshotId = u64;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot {id} not found")]
    NotFound { id: SnapshotId },

    #[error("snapshot I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot data error: {0}")]
    Codec(#[from] CodecError),
}

/// Storage for parameter snapshots
pub trait SnapshotBackend: Send + Sync {
    /// Store a snapshot under a fresh id, one above the highest existing id
    fn save(&self, params: &[Parameter]) -> Result<SnapshotId, SnapshotError>;

    fn load(&self, id: SnapshotId) -> Result<Vec<Parameter>, SnapshotError>;

    /// Remove a snapshot; removing a missing id is not an error
    fn delete(&self, id: SnapshotId) -> Result<SnapshotId, SnapshotError>;

    /// Remove every snapshot, returning the removed ids
    fn delete_all(&self) -> Result<Vec<SnapshotId>, SnapshotError>;

    /// Existing ids, ascending
    fn list(&self) -> Result<Vec<SnapshotId>, SnapshotError>;
}

/// Snapshots as codec-encoded files named by id inside one directory
#[derive(Debug)]
pub struct FileSnapshotBackend {
    location: PathBuf,
    codec: ParameterCodec,
    // serializes id allocation between concurrent saves
    save_lock: Mutex<()>,
}

impl FileSnapshotBackend {
    /// Open (and create if needed) the snapshot directory
    pub fn new(location: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let location = location.as_ref().to_path_buf();
        fs::create_dir_all(&location)?;
        debug!("snapshot location: {}", location.display());
        Ok(Self {
            location,
            codec: ParameterCodec::new(),
            save_lock: Mutex::new(()),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    fn path(&self, id: SnapshotId) -> PathBuf {
        self.location.join(id.to_string())
    }

    fn ids(&self) -> Result<Vec<SnapshotId>, SnapshotError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.location)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<SnapshotId>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

impl SnapshotBackend for FileSnapshotBackend {
    fn save(&self, params: &[Parameter]) -> Result<SnapshotId, SnapshotError> {
        let _guard = self.save_lock.lock();
        let id = self.ids()?.last().copied().unwrap_or(0) + 1;
        let path = self.path(id);
        debug!("saving snapshot {} to {}", id, path.display());
        fs::write(&path, self.codec.encode_pretty(params)?)?;
        Ok(id)
    }

    fn load(&self, id: SnapshotId) -> Result<Vec<Parameter>, SnapshotError> {
        let path = self.path(id);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound { id })
            }
            Err(e) => return Err(e.into()),
        };

        match self.codec.decode(&data) {
            Ok(params) => Ok(params),
            Err(CodecError::Empty) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: SnapshotId) -> Result<SnapshotId, SnapshotError> {
        debug!("delete snapshot {}", id);
        match fs::remove_file(self.path(id)) {
            Ok(()) => Ok(id),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(id),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_all(&self) -> Result<Vec<SnapshotId>, SnapshotError> {
        warn!("removing all snapshots in {}", self.location.display());
        let ids = self.ids()?;
        for id in &ids {
            self.delete(*id)?;
        }
        Ok(ids)
    }

    fn list(&self) -> Result<Vec<SnapshotId>, SnapshotError> {
        self.ids()
    }
}

/// In-memory snapshots, for tests and ephemeral controllers
#[derive(Debug, Default)]
pub struct MemorySnapshotBackend {
    snapshots: Mutex<BTreeMap<SnapshotId, Vec<Parameter>>>,
}

impl MemorySnapshotBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotBackend for MemorySnapshotBackend {
    fn save(&self, params: &[Parameter]) -> Result<SnapshotId, SnapshotError> {
        let mut snapshots = self.snapshots.lock();
        let id = snapshots.keys().next_back().copied().unwrap_or(0) + 1;
        snapshots.insert(id, params.to_vec());
        Ok(id)
    }

    fn load(&self, id: SnapshotId) -> Result<Vec<Parameter>, SnapshotError> {
        self.snapshots
            .lock()
            .get(&id)
            .cloned()
            .ok_or(SnapshotError::NotFound { id })
    }

    fn delete(&self, id: SnapshotId) -> Result<SnapshotId, SnapshotError> {
        self.snapshots.lock().remove(&id);
        Ok(id)
    }

    fn delete_all(&self) -> Result<Vec<SnapshotId>, SnapshotError> {
        let mut snapshots = self.snapshots.lock();
        let ids = snapshots.keys().copied().collect();
        snapshots.clear();
        Ok(ids)
    }

    fn list(&self) -> Result<Vec<SnapshotId>, SnapshotError> {
        Ok(self.snapshots.lock().keys().copied().collect())
    }
}
