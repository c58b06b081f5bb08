//! The structured outcome of a session and the synthesis of partial outcomes
//! for sessions that are stopped before reaching a Terminal node.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

mod synthesizer;

pub use synthesizer::{NO_RESPONSES, build_partial_artifact, resolve_references};

/// Fields every Terminal artifact must carry, as strings.
pub const UNIVERSAL_FIELDS: [&str; 6] = [
    "flow_id",
    "flow_version",
    "issue",
    "stop_reason",
    "last_confirmed_state",
    "safety_notes",
];

/// Optional common fields that must be arrays of strings when present.
pub const LIST_FIELDS: [&str; 2] = ["stabilization_actions", "recommendations"];

/// Optional common field that must be a string when present.
pub const NOTES_FIELD: &str = "notes";

/// Placeholder for a value that was never collected.
pub const UNKNOWN: &str = "Unknown";

/// Flat mapping of field name to value. Ordered so serialized artifacts are
/// byte-for-byte reproducible.
pub type Artifact = BTreeMap<String, ArtifactValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactValue {
    Text(String),
    List(Vec<String>),
}

impl ArtifactValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArtifactValue::Text(s) => Some(s),
            ArtifactValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ArtifactValue::List(items) => Some(items),
            ArtifactValue::Text(_) => None,
        }
    }
}

impl From<&str> for ArtifactValue {
    fn from(value: &str) -> Self {
        ArtifactValue::Text(value.to_string())
    }
}

impl From<String> for ArtifactValue {
    fn from(value: String) -> Self {
        ArtifactValue::Text(value)
    }
}

impl From<Vec<String>> for ArtifactValue {
    fn from(value: Vec<String>) -> Self {
        ArtifactValue::List(value)
    }
}

impl fmt::Display for ArtifactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactValue::Text(s) => write!(f, "{}", s),
            ArtifactValue::List(items) if items.is_empty() => write!(f, "(none)"),
            ArtifactValue::List(items) => write!(f, "{}", items.join("; ")),
        }
    }
}
