use super::{Event, EventKind, ResponseValue, SessionState};
use crate::artifact::Artifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The externally consumed record of one completed or stopped session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub flow_id: String,
    pub flow_version: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub events: Vec<Event>,
    pub terminal_node_id: Option<String>,
    pub result: Option<String>,
    pub artifact: Artifact,
    pub stopped: bool,
}

impl SessionSummary {
    /// Derives the summary of a finished session. Returns `None` while the
    /// session is still active.
    pub fn from_state(state: &SessionState) -> Option<Self> {
        let (completed_at, artifact) = if state.completed {
            (state.completed_at?, state.artifact.clone()?)
        } else if state.stopped {
            (state.stopped_at?, state.partial_artifact.clone()?)
        } else {
            return None;
        };

        Some(Self {
            flow_id: state.flow_id.clone(),
            flow_version: state.flow_version.clone(),
            session_id: state.session_id.clone(),
            started_at: state.started_at,
            completed_at,
            events: state.events.clone(),
            terminal_node_id: state.terminal_node_id.clone(),
            result: state.result.clone(),
            artifact,
            stopped: state.stopped,
        })
    }

    /// The summary with the session id and every timestamp removed. Two runs
    /// over the same flow with the same responses normalize to equal values.
    pub fn normalized(&self) -> NormalizedSummary {
        NormalizedSummary {
            flow_id: self.flow_id.clone(),
            flow_version: self.flow_version.clone(),
            events: self
                .events
                .iter()
                .map(|e| NormalizedEvent {
                    node_id: e.node_id.clone(),
                    kind: e.kind,
                    value: e.value.clone(),
                })
                .collect(),
            terminal_node_id: self.terminal_node_id.clone(),
            result: self.result.clone(),
            artifact: self.artifact.clone(),
            stopped: self.stopped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSummary {
    pub flow_id: String,
    pub flow_version: String,
    pub events: Vec<NormalizedEvent>,
    pub terminal_node_id: Option<String>,
    pub result: Option<String>,
    pub artifact: Artifact,
    pub stopped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub node_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub value: ResponseValue,
}
