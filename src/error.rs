use thiserror::Error;

/// Errors raised while validating a flow document. A flow that produces one of
/// these can never back an [`Engine`](crate::engine::Engine).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Flow is missing required top-level field '{field}' (must be a non-empty string)")]
    MissingTopLevelField { field: &'static str },

    #[error("Flow top-level field '{field}' is invalid ({rule}), found {found}")]
    InvalidTopLevelField {
        field: &'static str,
        rule: &'static str,
        found: &'static str,
    },

    #[error("Flow '{flow_id}' has no nodes: 'nodes' must be a non-empty mapping of node id to node")]
    EmptyNodes { flow_id: String },

    #[error("Flow '{flow_id}': 'nodes' is malformed: {message}")]
    MalformedNodes { flow_id: String, message: String },

    #[error("Flow '{flow_id}': duplicate node id '{node_id}' in node list")]
    DuplicateNode { flow_id: String, node_id: String },

    #[error("Flow '{flow_id}': startNode '{start_node}' does not exist in nodes")]
    StartNodeNotFound { flow_id: String, start_node: String },

    #[error("Flow '{flow_id}', node '{node_id}': unknown node type '{type_name}'")]
    UnknownNodeType {
        flow_id: String,
        node_id: String,
        type_name: String,
    },

    #[error("Flow '{flow_id}', node '{node_id}': missing or invalid field '{field}' ({rule})")]
    InvalidField {
        flow_id: String,
        node_id: String,
        field: String,
        rule: String,
    },

    #[error(
        "Flow '{flow_id}', Safety node '{node_id}': uses '{found}' instead of 'next'; the transition field must be named 'next'"
    )]
    AlternateNextField {
        flow_id: String,
        node_id: String,
        found: String,
    },

    #[error(
        "Flow '{flow_id}', node '{node_id}': field '{field}' references missing node '{target}'"
    )]
    DanglingReference {
        flow_id: String,
        node_id: String,
        field: String,
        target: String,
    },

    #[error(
        "Flow '{flow_id}', Measure node '{node_id}': validRange min must be less than max (min = {min}, max = {max})"
    )]
    InvalidRange {
        flow_id: String,
        node_id: String,
        min: f64,
        max: f64,
    },

    #[error("Flow '{flow_id}', Measure node '{node_id}': branch {index} condition is invalid: {source}")]
    InvalidCondition {
        flow_id: String,
        node_id: String,
        index: usize,
        #[source]
        source: ConditionError,
    },

    #[error("Flow '{flow_id}': unreachable nodes from startNode: {node_ids}")]
    UnreachableNodes { flow_id: String, node_ids: String },

    #[error("Flow '{flow_id}': flow has no Terminal node")]
    NoTerminalNode { flow_id: String },
}

/// Errors produced when parsing a branch condition such as `< 11.8`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    #[error("condition is empty")]
    Empty,

    #[error("condition '{0}' does not start with one of <, <=, >, >=, ==, !=")]
    UnknownOperator(String),

    #[error("condition '{condition}' has an invalid numeric literal '{literal}'")]
    InvalidLiteral { condition: String, literal: String },
}

/// Errors raised while driving a session. The persisted state is left untouched
/// whenever one of these is returned.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Node '{node_id}' ({node_type}) expects {expected}, but received {found}")]
    ResponseTypeMismatch {
        node_id: String,
        node_type: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Value {value} for Measure node '{node_id}' is outside the valid range [{min}, {max}]")]
    OutOfRange {
        node_id: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Answer '{answer}' is not an option of Question node '{node_id}' (expected one of: {options})")]
    UnknownAnswer {
        node_id: String,
        answer: String,
        options: String,
    },

    #[error("No branch of Measure node '{node_id}' matches value {value}")]
    NoMatchingBranch { node_id: String, value: f64 },

    #[error("Node '{node_id}' does not exist in flow '{flow_id}'")]
    NodeNotFound { flow_id: String, node_id: String },

    #[error("Session '{session_id}' is already {status} and accepts no further input")]
    SessionFinished {
        session_id: String,
        status: &'static str,
    },

    #[error("Session belongs to flow '{found}', but this engine runs flow '{expected}'")]
    FlowMismatch { expected: String, found: String },

    #[error("Storage failure, transition not committed: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised at the persistence boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored record could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to persist '{path}': {message}")]
    Persist { path: String, message: String },

    #[error("Storage lock poisoned: {0}")]
    Poisoned(String),
}

/// Errors that can occur while reading a flow document from disk or text.
#[derive(Error, Debug)]
pub enum FlowLoadError {
    #[error("Could not read flow file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse flow JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Flow document conversion failed: {0}")]
    Conversion(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
