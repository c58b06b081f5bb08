use super::ResponseValue;
use crate::artifact::Artifact;
use crate::flow::{FlowDefinition, NodeKind, TerminalNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of step an [`Event`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Question,
    Safety,
    Measure,
    Terminal,
    Stop,
}

impl EventKind {
    /// True for events that carry an operator answer.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            EventKind::Question | EventKind::Safety | EventKind::Measure
        )
    }
}

impl From<NodeKind> for EventKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Question => EventKind::Question,
            NodeKind::Safety => EventKind::Safety,
            NodeKind::Measure => EventKind::Measure,
            NodeKind::Terminal => EventKind::Terminal,
        }
    }
}

/// One append-only entry of the session replay log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub node_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub value: ResponseValue,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        node_id: impl Into<String>,
        kind: EventKind,
        value: ResponseValue,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            value,
            timestamp,
        }
    }
}

/// The single mutable record of one procedure.
///
/// Transitions never modify a state in place; the engine derives a new value
/// for every step and persists it whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub flow_id: String,
    pub flow_version: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub current_node_id: String,
    pub events: Vec<Event>,
    pub completed: bool,
    pub stopped: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_artifact: Option<Artifact>,
}

impl SessionState {
    pub(crate) fn new(flow: &FlowDefinition, session_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            flow_id: flow.flow_id().to_string(),
            flow_version: flow.flow_version().to_string(),
            session_id,
            started_at,
            current_node_id: flow.start_node().to_string(),
            events: Vec::new(),
            completed: false,
            stopped: false,
            completed_at: None,
            terminal_node_id: None,
            result: None,
            artifact: None,
            stopped_at: None,
            stop_node_id: None,
            partial_artifact: None,
        }
    }

    /// Neither completed nor stopped.
    pub fn is_active(&self) -> bool {
        !self.completed && !self.stopped
    }

    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }

    /// Last answered event, ignoring terminal and stop markers.
    pub fn last_response(&self) -> Option<&Event> {
        self.events.iter().rev().find(|e| e.kind.is_response())
    }

    pub(crate) fn advanced(&self, event: Event, next_node_id: &str) -> Self {
        let mut next = self.clone();
        next.events.push(event);
        next.current_node_id = next_node_id.to_string();
        next
    }

    pub(crate) fn completed_at_terminal(
        &self,
        terminal_id: &str,
        terminal: &TerminalNode,
        at: DateTime<Utc>,
    ) -> Self {
        let mut next = self.clone();
        next.events.push(Event::new(
            terminal_id,
            EventKind::Terminal,
            ResponseValue::Text(terminal.result.clone()),
            at,
        ));
        next.current_node_id = terminal_id.to_string();
        next.completed = true;
        next.completed_at = Some(at);
        next.terminal_node_id = Some(terminal_id.to_string());
        next.result = Some(terminal.result.clone());
        next.artifact = Some(terminal.artifact.clone());
        next
    }

    pub(crate) fn stopped_with(&self, partial_artifact: Artifact, at: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.events.push(Event::new(
            self.current_node_id.clone(),
            EventKind::Stop,
            ResponseValue::Text("STOP".to_string()),
            at,
        ));
        next.stopped = true;
        next.stopped_at = Some(at);
        next.stop_node_id = Some(self.current_node_id.clone());
        next.partial_artifact = Some(partial_artifact);
        next
    }
}
