use crate::artifact::build_partial_artifact;
use crate::error::EngineError;
use crate::flow::{FlowDefinition, Node};
use crate::session::{Event, ResponseValue, SessionState, SessionSummary};
use crate::store::SessionStore;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

mod transition;

use transition::Route;

/// Drives sessions through one validated flow.
///
/// The engine holds no session data of its own. Every operation takes the
/// current [`SessionState`] by reference and returns a new one; the returned
/// value has already been written to the store when the call succeeds.
///
/// ```rust
/// use shindan::prelude::*;
/// use serde_json::json;
///
/// # fn main() -> Result<()> {
/// let flow = load_flow_from(json!({
///     "flowId": "fuse-check",
///     "flowVersion": "1.0",
///     "startNode": "q1",
///     "nodes": {
///         "q1": { "type": "question", "text": "Is the fuse blown?", "answers": { "yes": "done", "no": "done" } },
///         "done": { "type": "terminal", "result": "Inspected", "artifact": {
///             "flow_id": "fuse-check", "flow_version": "1.0", "issue": "fuse",
///             "stop_reason": "", "last_confirmed_state": "inspected", "safety_notes": ""
///         } }
///     }
/// }))?;
///
/// let engine = Engine::new(flow, MemoryStore::new());
/// let session = engine.start_session()?;
/// let session = engine.process_response(&session, "yes")?;
/// assert!(session.completed);
/// assert_eq!(session.result.as_deref(), Some("Inspected"));
/// # Ok(())
/// # }
/// ```
pub struct Engine<S: SessionStore> {
    flow: FlowDefinition,
    store: S,
}

impl<S: SessionStore> Engine<S> {
    pub fn new(flow: FlowDefinition, store: S) -> Self {
        Self { flow, store }
    }

    pub fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Releases the store, e.g. to rebuild an engine from persisted state only.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Creates and persists a fresh session positioned at the start node.
    /// Any previously persisted session is superseded.
    pub fn start_session(&self) -> Result<SessionState, EngineError> {
        let state = SessionState::new(&self.flow, Uuid::new_v4().to_string(), Utc::now());
        self.store.save_session_state(&state)?;
        info!(
            flow_id = %state.flow_id,
            session_id = %state.session_id,
            start_node = %state.current_node_id,
            "session started"
        );
        Ok(state)
    }

    /// Returns the persisted session if it belongs to this flow and is still
    /// active. Calling it repeatedly returns the same state.
    pub fn resume_session(&self) -> Result<Option<SessionState>, EngineError> {
        let Some(state) = self.store.load_session_state()? else {
            return Ok(None);
        };

        if state.flow_id != self.flow.flow_id() {
            debug!(
                persisted_flow = %state.flow_id,
                flow_id = %self.flow.flow_id(),
                "persisted session belongs to another flow"
            );
            return Ok(None);
        }
        if state.is_finished() {
            return Ok(None);
        }

        info!(
            session_id = %state.session_id,
            current_node = %state.current_node_id,
            events = state.events.len(),
            "session resumed"
        );
        Ok(Some(state))
    }

    /// The node the session is waiting on.
    pub fn current_node(&self, state: &SessionState) -> Result<&Node, EngineError> {
        self.node(&state.current_node_id)
    }

    /// Applies one operator response and returns the resulting state.
    ///
    /// Reaching a Terminal node completes the session within the same call.
    /// On any error the persisted state is exactly what it was before.
    pub fn process_response(
        &self,
        state: &SessionState,
        value: impl Into<ResponseValue>,
    ) -> Result<SessionState, EngineError> {
        let value = value.into();
        self.ensure_active(state)?;

        let node_id = state.current_node_id.as_str();
        let node = self.current_node(state)?;
        let now = Utc::now();

        let route = transition::route(node_id, node, &value).inspect_err(|e| {
            warn!(session_id = %state.session_id, node_id, error = %e, "response rejected");
        })?;

        let next = match route {
            Route::Complete => self.complete(state, node_id, now)?,
            Route::Advance(next_id) => {
                let event = Event::new(node_id, node.kind().into(), value, now);
                let advanced = state.advanced(event, next_id);
                match self.node(next_id)? {
                    Node::Terminal(_) => self.complete(&advanced, next_id, now)?,
                    _ => advanced,
                }
            }
        };

        self.commit(state, &next)?;
        debug!(
            session_id = %next.session_id,
            from = node_id,
            to = %next.current_node_id,
            completed = next.completed,
            "transition committed"
        );
        Ok(next)
    }

    /// Ends an active session early with a partial artifact.
    pub fn stop_session(&self, state: &SessionState) -> Result<SessionState, EngineError> {
        self.ensure_active(state)?;

        let artifact = build_partial_artifact(&self.flow, state);
        let stopped = state.stopped_with(artifact, Utc::now());
        self.commit(state, &stopped)?;

        info!(
            session_id = %stopped.session_id,
            stop_node = %stopped.current_node_id,
            events = stopped.events.len(),
            "session stopped"
        );
        Ok(stopped)
    }

    pub fn history(&self) -> Result<Vec<SessionSummary>, EngineError> {
        Ok(self.store.session_history()?)
    }

    /// Drops the persisted current session, leaving history intact.
    pub fn clear_session(&self) -> Result<(), EngineError> {
        Ok(self.store.clear_session_state()?)
    }

    fn node(&self, node_id: &str) -> Result<&Node, EngineError> {
        self.flow
            .node(node_id)
            .ok_or_else(|| EngineError::NodeNotFound {
                flow_id: self.flow.flow_id().to_string(),
                node_id: node_id.to_string(),
            })
    }

    fn ensure_active(&self, state: &SessionState) -> Result<(), EngineError> {
        if state.flow_id != self.flow.flow_id() {
            return Err(EngineError::FlowMismatch {
                expected: self.flow.flow_id().to_string(),
                found: state.flow_id.clone(),
            });
        }
        if state.completed || state.stopped {
            return Err(EngineError::SessionFinished {
                session_id: state.session_id.clone(),
                status: if state.completed { "completed" } else { "stopped" },
            });
        }
        Ok(())
    }

    fn complete(
        &self,
        state: &SessionState,
        terminal_id: &str,
        at: chrono::DateTime<Utc>,
    ) -> Result<SessionState, EngineError> {
        match self.node(terminal_id)? {
            Node::Terminal(terminal) => {
                let completed = state.completed_at_terminal(terminal_id, terminal, at);
                info!(
                    session_id = %completed.session_id,
                    terminal_node = terminal_id,
                    result = %terminal.result,
                    "session completed"
                );
                Ok(completed)
            }
            _ => Err(EngineError::NodeNotFound {
                flow_id: self.flow.flow_id().to_string(),
                node_id: terminal_id.to_string(),
            }),
        }
    }

    /// Persists `next` over `previous`. A finished session's summary is
    /// appended to history after the state write; if that append fails the
    /// state slot is rolled back to `previous`, so neither slot reflects a
    /// transition that returned an error.
    fn commit(&self, previous: &SessionState, next: &SessionState) -> Result<(), EngineError> {
        self.store.save_session_state(next)?;

        let Some(summary) = SessionSummary::from_state(next) else {
            return Ok(());
        };
        if let Err(e) = self.store.save_session_summary(&summary) {
            if let Err(rollback) = self.store.save_session_state(previous) {
                warn!(
                    session_id = %previous.session_id,
                    error = %rollback,
                    "failed to roll back session state"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }
}
