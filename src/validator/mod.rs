//! Gatekeeper between an untrusted [`FlowDocument`] and a [`FlowDefinition`].
//!
//! Checks run in a fixed order and stop at the first violation:
//!
//! 1. top-level shape (`flowId`, `flowVersion`, `startNode`, `nodes`),
//! 2. per-node structure, dispatched on the node `type`,
//! 3. reachability of every node from `startNode`,
//! 4. presence of at least one Terminal node.

use crate::error::ValidationError;
use crate::flow::{FlowDefinition, FlowDocument, Node};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

mod nodes;
mod reachability;

pub use reachability::unreachable_nodes;

/// Raw node bodies keyed by id, after normalizing both document encodings.
pub(crate) type RawNodes = BTreeMap<String, Map<String, Value>>;

/// Validates `document` and returns the typed, immutable flow it describes.
pub fn validate(document: &FlowDocument) -> Result<FlowDefinition, ValidationError> {
    let flow_id = top_level_string(&document.flow_id, "flowId")?;
    let flow_version = top_level_string(&document.flow_version, "flowVersion")?;
    let start_node = top_level_string(&document.start_node, "startNode")?;
    let title = match &document.title {
        Value::Null => None,
        Value::String(title) => Some(title.clone()),
        other => {
            return Err(ValidationError::InvalidTopLevelField {
                field: "title",
                rule: "must be a string when present",
                found: json_type(other),
            });
        }
    };

    let raw_nodes = normalize_nodes(&flow_id, &document.nodes)?;
    if !raw_nodes.contains_key(&start_node) {
        return Err(ValidationError::StartNodeNotFound {
            flow_id,
            start_node,
        });
    }

    let mut nodes = BTreeMap::new();
    for (node_id, body) in &raw_nodes {
        let node = nodes::parse_node(&flow_id, node_id, body, &raw_nodes)?;
        nodes.insert(node_id.clone(), node);
    }

    let unreachable = unreachable_nodes(&start_node, &nodes);
    if !unreachable.is_empty() {
        return Err(ValidationError::UnreachableNodes {
            flow_id,
            node_ids: itertools::join(unreachable, ", "),
        });
    }

    if !nodes.values().any(|n| matches!(n, Node::Terminal(_))) {
        return Err(ValidationError::NoTerminalNode { flow_id });
    }

    debug!(flow_id = %flow_id, nodes = nodes.len(), "flow validated");
    Ok(FlowDefinition::new(
        flow_id,
        flow_version,
        title,
        start_node,
        nodes,
    ))
}

fn top_level_string(value: &Value, field: &'static str) -> Result<String, ValidationError> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingTopLevelField { field })
}

/// Accepts `{ "<id>": {..} }` or `[ { "id": "<id>", .. } ]` and yields the same
/// id -> body mapping for both.
fn normalize_nodes(flow_id: &str, nodes: &Value) -> Result<RawNodes, ValidationError> {
    let malformed = |message: String| ValidationError::MalformedNodes {
        flow_id: flow_id.to_string(),
        message,
    };

    let normalized = match nodes {
        Value::Null => RawNodes::new(),
        Value::Object(entries) => entries
            .iter()
            .map(|(id, body)| match body {
                Value::Object(body) => Ok((id.clone(), body.clone())),
                other => Err(malformed(format!(
                    "node '{}' must be an object, found {}",
                    id,
                    json_type(other)
                ))),
            })
            .collect::<Result<_, _>>()?,
        Value::Array(items) => {
            let mut normalized = RawNodes::new();
            for (index, item) in items.iter().enumerate() {
                let body = item.as_object().ok_or_else(|| {
                    malformed(format!(
                        "entry {} must be an object, found {}",
                        index,
                        json_type(item)
                    ))
                })?;
                let id = body
                    .get("id")
                    .and_then(Value::as_str)
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| {
                        malformed(format!("entry {} has no non-empty string 'id'", index))
                    })?;
                if normalized.insert(id.to_string(), body.clone()).is_some() {
                    return Err(ValidationError::DuplicateNode {
                        flow_id: flow_id.to_string(),
                        node_id: id.to_string(),
                    });
                }
            }
            normalized
        }
        other => {
            return Err(malformed(format!(
                "expected an object or array, found {}",
                json_type(other)
            )));
        }
    };

    if normalized.is_empty() {
        return Err(ValidationError::EmptyNodes {
            flow_id: flow_id.to_string(),
        });
    }
    Ok(normalized)
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
