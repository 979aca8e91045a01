//! Persistence boundary for the live game snapshot and the match library.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::StorageConfig,
    error::StoreError,
    record::{MatchRecord, SessionSnapshot},
};

pub const SNAPSHOT_FILE: &str = "saved_game.json";
pub const LIBRARY_FILE: &str = "library.json";

/// Storage for the resumable snapshot and archived matches.
///
/// Implementations must be shareable with the engine task that archives a
/// finished game.
pub trait MatchStore: Send + Sync {
    fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;

    fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StoreError>;

    fn append_match_record(&self, record: &MatchRecord) -> Result<(), StoreError>;

    /// Archived matches, most recent first.
    fn list_match_records(&self) -> Result<Vec<MatchRecord>, StoreError>;

    /// Removes a match. Returns whether it existed.
    fn delete_match_record(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// JSON files in one directory: `saved_game.json` and `library.json`.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    // Serializes read-modify-write of the library file.
    library_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            library_lock: Mutex::new(()),
        })
    }

    /// Opens the directory named by `[storage] dir`.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        Self::open(config.dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).map_err(|source| StoreError::Io { path, source })
    }
}

impl MatchStore for JsonFileStore {
    fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        self.write_json(SNAPSHOT_FILE, snapshot)
    }

    fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        self.read_json(SNAPSHOT_FILE)
    }

    fn append_match_record(&self, record: &MatchRecord) -> Result<(), StoreError> {
        let _guard = self.library_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut library: Vec<MatchRecord> = self.read_json(LIBRARY_FILE)?.unwrap_or_default();
        library.insert(0, record.clone());
        self.write_json(LIBRARY_FILE, &library)?;
        debug!(id = %record.id, total = library.len(), "archived match");
        Ok(())
    }

    fn list_match_records(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let _guard = self.library_lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_json(LIBRARY_FILE)?.unwrap_or_default())
    }

    fn delete_match_record(&self, id: Uuid) -> Result<bool, StoreError> {
        let _guard = self.library_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut library: Vec<MatchRecord> = self.read_json(LIBRARY_FILE)?.unwrap_or_default();
        let before = library.len();
        library.retain(|r| r.id != id);
        if library.len() == before {
            return Ok(false);
        }
        self.write_json(LIBRARY_FILE, &library)?;
        Ok(true)
    }
}

/// In-process store, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    snapshot: Option<SessionSnapshot>,
    snapshot_writes: usize,
    // Most recent first.
    library: Vec<MatchRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a snapshot has been written.
    pub fn snapshot_writes(&self) -> usize {
        self.lock().snapshot_writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MatchStore for MemoryStore {
    fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.snapshot = Some(snapshot.clone());
        inner.snapshot_writes += 1;
        Ok(())
    }

    fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        Ok(self.lock().snapshot.clone())
    }

    fn append_match_record(&self, record: &MatchRecord) -> Result<(), StoreError> {
        self.lock().library.insert(0, record.clone());
        Ok(())
    }

    fn list_match_records(&self) -> Result<Vec<MatchRecord>, StoreError> {
        Ok(self.lock().library.clone())
    }

    fn delete_match_record(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.library.len();
        inner.library.retain(|r| r.id != id);
        Ok(inner.library.len() != before)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
