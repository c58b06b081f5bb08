use super::{Artifact, ArtifactValue, UNIVERSAL_FIELDS, UNKNOWN};
use crate::flow::FlowDefinition;
use crate::session::{Event, SessionState};
use ahash::AHashMap;

/// Sentinel used for `last_confirmed_state` when nothing was answered yet.
pub const NO_RESPONSES: &str = "No responses recorded";

/// Builds the artifact for a session stopped before reaching a Terminal node.
///
/// The first Terminal node (in node-id order) provides the field names. Every
/// flow-specific field starts out as `"Unknown"` (or `[]` for lists) unless its
/// template string embeds `{{nodeId.value}}` references, which are resolved
/// against the answers recorded so far. List entries with references are
/// resolved and kept; the rest are dropped. This never fails: a session with zero
/// events still gets all six universal fields.
pub fn build_partial_artifact(flow: &FlowDefinition, state: &SessionState) -> Artifact {
    let answers = answer_index(&state.events);
    let template = flow.terminal_nodes().next().map(|(_, t)| &t.artifact);

    let mut artifact: Artifact = template
        .into_iter()
        .flatten()
        .filter(|(key, _)| !UNIVERSAL_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), placeholder(value, &answers)))
        .collect();

    let issue = template
        .and_then(|t| t.get("issue"))
        .map(|value| placeholder(value, &answers))
        .unwrap_or_else(|| UNKNOWN.into());

    artifact.insert("flow_id".into(), flow.flow_id().into());
    artifact.insert("flow_version".into(), flow.flow_version().into());
    artifact.insert("issue".into(), issue);
    artifact.insert(
        "stop_reason".into(),
        format!("User stopped diagnostic at node: {}", state.current_node_id).into(),
    );
    artifact.insert(
        "last_confirmed_state".into(),
        last_confirmed_state(state).into(),
    );
    artifact.insert("safety_notes".into(), "".into());
    artifact
}

/// Replaces every `{{nodeId.value}}` in `template` with the recorded answer
/// for `nodeId`, or `"Unknown"` when that node was never answered. Anything
/// that is not a well-formed reference is copied through untouched.
pub fn resolve_references(template: &str, answers: &AHashMap<&str, String>) -> String {
    substitute(template, |node_id| {
        answers
            .get(node_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string())
    })
    .0
}

fn placeholder(value: &ArtifactValue, answers: &AHashMap<&str, String>) -> ArtifactValue {
    match value {
        ArtifactValue::Text(text) if has_references(text) => {
            ArtifactValue::Text(resolve_references(text, answers))
        }
        ArtifactValue::Text(_) => ArtifactValue::Text(UNKNOWN.to_string()),
        ArtifactValue::List(items) => ArtifactValue::List(
            items
                .iter()
                .filter(|item| has_references(item))
                .map(|item| resolve_references(item, answers))
                .collect(),
        ),
    }
}

fn has_references(template: &str) -> bool {
    substitute(template, |_| String::new()).1 > 0
}

/// Node id -> stringified last answer, in event order so a revisited node keeps
/// its most recent value.
fn answer_index(events: &[Event]) -> AHashMap<&str, String> {
    events
        .iter()
        .filter(|e| e.kind.is_response())
        .map(|e| (e.node_id.as_str(), e.value.to_string()))
        .collect()
}

fn last_confirmed_state(state: &SessionState) -> String {
    match state.last_response() {
        Some(event) => format!(
            "Last confirmed: {} = {}; stopped at node: {}",
            event.node_id, event.value, state.current_node_id
        ),
        None => format!(
            "{}; stopped at node: {}",
            NO_RESPONSES, state.current_node_id
        ),
    }
}

/// Walks `template`, calling `lookup` for each `{{id.value}}` reference.
/// Returns the rewritten text and the number of references found.
fn substitute<'a>(template: &'a str, mut lookup: impl FnMut(&'a str) -> String) -> (String, usize) {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut found = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return (out, found);
        };

        match after[..end].trim().strip_suffix(".value") {
            Some(node_id) if !node_id.is_empty() => {
                found += 1;
                out.push_str(&lookup(node_id));
            }
            _ => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    (out, found)
}
