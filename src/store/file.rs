use super::SessionStore;
use crate::error::StorageError;
use crate::session::{SessionState, SessionSummary};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Directory-backed store that survives process termination.
///
/// Each slot is one JSON file. Writes go to a temporary file in the same
/// directory which is then renamed over the target, so a reader sees either the
/// old record or the new one, never a torn write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub const STATE_FILE: &'static str = "current_session.json";
    pub const HISTORY_FILE: &'static str = "session_history.json";

    /// Opens (creating if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StorageError> {
        let path = self.dir.join(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StorageError> {
        let path = self.dir.join(name);
        let bytes = serde_json::to_vec_pretty(value)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StorageError::Persist {
            path: path.display().to_string(),
            message: e.error.to_string(),
        })?;

        debug!(path = %path.display(), bytes = bytes.len(), "store slot written");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.dir.join(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileStore {
    fn save_session_state(&self, state: &SessionState) -> Result<(), StorageError> {
        self.write(Self::STATE_FILE, state)
    }

    fn load_session_state(&self) -> Result<Option<SessionState>, StorageError> {
        self.read(Self::STATE_FILE)
    }

    fn clear_session_state(&self) -> Result<(), StorageError> {
        self.remove(Self::STATE_FILE)
    }

    fn save_session_summary(&self, summary: &SessionSummary) -> Result<(), StorageError> {
        let mut history: Vec<SessionSummary> = self.read(Self::HISTORY_FILE)?.unwrap_or_default();
        if history.iter().any(|s| s.session_id == summary.session_id) {
            return Ok(());
        }
        history.push(summary.clone());
        self.write(Self::HISTORY_FILE, &history)
    }

    fn session_history(&self) -> Result<Vec<SessionSummary>, StorageError> {
        Ok(self.read(Self::HISTORY_FILE)?.unwrap_or_default())
    }

    fn clear_session_history(&self) -> Result<(), StorageError> {
        self.remove(Self::HISTORY_FILE)
    }
}
