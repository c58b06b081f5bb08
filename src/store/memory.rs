use super::SessionStore;
use crate::error::StorageError;
use crate::session::{SessionState, SessionSummary};
use std::sync::{Mutex, MutexGuard};

/// In-process store. Nothing survives the process, but the contract (single
/// slot, deduplicated history) is identical to [`FileStore`](super::FileStore).
#[derive(Debug, Default)]
pub struct MemoryStore {
    current: Mutex<Option<SessionState>>,
    history: Mutex<Vec<SessionSummary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Poisoned(e.to_string()))
}

impl SessionStore for MemoryStore {
    fn save_session_state(&self, state: &SessionState) -> Result<(), StorageError> {
        *lock(&self.current)? = Some(state.clone());
        Ok(())
    }

    fn load_session_state(&self) -> Result<Option<SessionState>, StorageError> {
        Ok(lock(&self.current)?.clone())
    }

    fn clear_session_state(&self) -> Result<(), StorageError> {
        *lock(&self.current)? = None;
        Ok(())
    }

    fn save_session_summary(&self, summary: &SessionSummary) -> Result<(), StorageError> {
        let mut history = lock(&self.history)?;
        if !history.iter().any(|s| s.session_id == summary.session_id) {
            history.push(summary.clone());
        }
        Ok(())
    }

    fn session_history(&self) -> Result<Vec<SessionSummary>, StorageError> {
        Ok(lock(&self.history)?.clone())
    }

    fn clear_session_history(&self) -> Result<(), StorageError> {
        lock(&self.history)?.clear();
        Ok(())
    }
}
