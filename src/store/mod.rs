//! The persistence collaborator consumed by the engine.
//!
//! A store holds exactly one slot for the current session state and one
//! append-only collection of session summaries.

use crate::error::StorageError;
use crate::session::{SessionState, SessionSummary};

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

pub trait SessionStore {
    /// Replaces the current-session slot. Must either fully commit or fail.
    fn save_session_state(&self, state: &SessionState) -> Result<(), StorageError>;

    fn load_session_state(&self) -> Result<Option<SessionState>, StorageError>;

    fn clear_session_state(&self) -> Result<(), StorageError>;

    /// Appends to history. A summary whose session id is already present is
    /// silently ignored.
    fn save_session_summary(&self, summary: &SessionSummary) -> Result<(), StorageError>;

    /// Summaries in the order they were first saved.
    fn session_history(&self) -> Result<Vec<SessionSummary>, StorageError>;

    fn clear_session_history(&self) -> Result<(), StorageError>;
}

impl<T: SessionStore + ?Sized> SessionStore for &T {
    fn save_session_state(&self, state: &SessionState) -> Result<(), StorageError> {
        (**self).save_session_state(state)
    }

    fn load_session_state(&self) -> Result<Option<SessionState>, StorageError> {
        (**self).load_session_state()
    }

    fn clear_session_state(&self) -> Result<(), StorageError> {
        (**self).clear_session_state()
    }

    fn save_session_summary(&self, summary: &SessionSummary) -> Result<(), StorageError> {
        (**self).save_session_summary(summary)
    }

    fn session_history(&self) -> Result<Vec<SessionSummary>, StorageError> {
        (**self).session_history()
    }

    fn clear_session_history(&self) -> Result<(), StorageError> {
        (**self).clear_session_history()
    }
}
