use super::document::FlowDocument;
use crate::error::FlowLoadError;

/// A trait for custom authoring formats that can be mapped onto a `FlowDocument`.
///
/// Implement this on your own structs to feed the validator from any format.
/// The conversion only has to reshape data; every semantic check happens in
/// [`crate::validator::validate`] afterwards.
///
/// # Example
///
/// ```rust
/// use shindan::flow::{FlowDocument, IntoFlowDocument};
/// use shindan::error::FlowLoadError;
/// use serde_json::json;
///
/// struct Checklist { id: String, steps: Vec<String> }
///
/// impl IntoFlowDocument for Checklist {
///     fn into_flow_document(self) -> Result<FlowDocument, FlowLoadError> {
///         let mut nodes = serde_json::Map::new();
///         let count = self.steps.len();
///         for (i, step) in self.steps.into_iter().enumerate() {
///             let next = if i + 1 == count { "done".to_string() } else { format!("step{}", i + 1) };
///             nodes.insert(format!("step{i}"), json!({ "type": "safety", "text": step, "next": next }));
///         }
///         nodes.insert("done".into(), json!({
///             "type": "terminal",
///             "result": "Checklist complete",
///             "artifact": {
///                 "flow_id": self.id.clone(), "flow_version": "1", "issue": "none",
///                 "stop_reason": "", "last_confirmed_state": "done", "safety_notes": ""
///             }
///         }));
///         Ok(FlowDocument {
///             flow_id: json!(self.id),
///             flow_version: json!("1"),
///             start_node: json!("step0"),
///             nodes: nodes.into(),
///             ..Default::default()
///         })
///     }
/// }
///
/// let doc = Checklist { id: "pre-start".into(), steps: vec!["Chock the wheels".into()] }
///     .into_flow_document()
///     .unwrap();
/// assert!(shindan::validator::validate(&doc).is_ok());
/// ```
pub trait IntoFlowDocument {
    /// Consumes the object and converts it into the canonical flow document.
    fn into_flow_document(self) -> Result<FlowDocument, FlowLoadError>;
}

impl IntoFlowDocument for FlowDocument {
    fn into_flow_document(self) -> Result<FlowDocument, FlowLoadError> {
        Ok(self)
    }
}

impl IntoFlowDocument for serde_json::Value {
    fn into_flow_document(self) -> Result<FlowDocument, FlowLoadError> {
        if !self.is_object() {
            return Err(FlowLoadError::Conversion(
                "flow document must be a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(self)?)
    }
}
