pub mod conversion;
pub mod definition;
pub mod document;

pub use conversion::*;
pub use definition::*;
pub use document::*;

use crate::error::FlowLoadError;
use std::path::Path;

/// Reads, parses and validates a flow document in one step.
pub fn load_flow(path: impl AsRef<Path>) -> Result<FlowDefinition, FlowLoadError> {
    let document = FlowDocument::from_file(path)?;
    Ok(crate::validator::validate(&document)?)
}

/// Parses and validates any value that can be turned into a `FlowDocument`.
pub fn load_flow_from<T: IntoFlowDocument>(source: T) -> Result<FlowDefinition, FlowLoadError> {
    let document = source.into_flow_document()?;
    Ok(crate::validator::validate(&document)?)
}
