//! # Shindan - Guided Diagnostic Flow Engine
//!
//! **Shindan** walks an operator through a declarative decision-tree document
//! ("flow") one step at a time and produces a structured outcome record
//! ("artifact") for the technician who picks up the case.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: Parse a JSON flow document into a [`flow::FlowDocument`], or map
//!     your own authoring format onto one with [`flow::IntoFlowDocument`].
//! 2.  **Validate**: [`validator::validate`] checks structure, references and
//!     reachability and returns the typed [`flow::FlowDefinition`]. A document
//!     that fails here can never drive a session.
//! 3.  **Run**: Build an [`engine::Engine`] over the flow and a
//!     [`store::SessionStore`], then `start_session`, `process_response` for each
//!     operator answer, and optionally `stop_session`. Every transition is
//!     persisted before it is returned, so `resume_session` picks up after a crash.
//! 4.  **Collect**: Finished sessions land in the store's history as
//!     [`session::SessionSummary`] records.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shindan::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let flow = load_flow("flows/battery.json")?;
//!     let engine = Engine::new(flow, FileStore::open(".shindan")?);
//!
//!     let mut session = match engine.resume_session()? {
//!         Some(session) => session,
//!         None => engine.start_session()?,
//!     };
//!
//!     for answer in [ResponseValue::from("yes"), true.into(), 12.4.into()] {
//!         session = engine.process_response(&session, answer)?;
//!         if session.completed {
//!             break;
//!         }
//!     }
//!
//!     for summary in engine.history()? {
//!         println!("{} -> {:?}", summary.session_id, summary.result);
//!     }
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod condition;
pub mod engine;
pub mod error;
pub mod flow;
pub mod prelude;
pub mod session;
pub mod store;
pub mod validator;
