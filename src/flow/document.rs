use crate::error::FlowLoadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// The untrusted, loosely typed shape of a flow document as it arrives from disk.
///
/// Every field is kept as raw JSON so that a missing or mistyped field surfaces
/// as a specific [`ValidationError`](crate::error::ValidationError) instead of a
/// generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDocument {
    #[serde(default)]
    pub flow_id: Value,
    #[serde(default)]
    pub flow_version: Value,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub start_node: Value,
    /// Either `{ "<id>": { ... } }` or `[ { "id": "<id>", ... } ]`.
    #[serde(default)]
    pub nodes: Value,
}

impl FlowDocument {
    pub fn from_json_str(json: &str) -> Result<Self, FlowLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowLoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| FlowLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}
