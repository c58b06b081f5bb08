//! Prelude module for convenient imports
//!
//! Re-exports the types needed to load a flow, drive sessions and read their
//! outcomes.
//!
//! # Example
//!
//! ```rust,no_run
//! use shindan::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let flow = load_flow("path/to/flow.json")?;
//! let engine = Engine::new(flow, MemoryStore::new());
//! let session = engine.start_session()?;
//! let stopped = engine.stop_session(&session)?;
//! println!("{:?}", stopped.partial_artifact);
//! # Ok(())
//! # }
//! ```

// Engine and persistence
pub use crate::engine::Engine;
pub use crate::store::{FileStore, MemoryStore, SessionStore};

// Flow model
pub use crate::flow::{
    FlowDefinition, FlowDocument, IntoFlowDocument, Node, NodeKind, load_flow, load_flow_from,
};
pub use crate::validator::validate;

// Session model
pub use crate::artifact::{Artifact, ArtifactValue};
pub use crate::session::{Event, EventKind, ResponseValue, SessionState, SessionSummary};

// Error types
pub use crate::error::{EngineError, FlowLoadError, StorageError, ValidationError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
