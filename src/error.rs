//! Error types: action faults, step-loop faults, and graph validation rejections.

use thiserror::Error;

/// Fault raised by an action implementation. Fatal to the run that invoked it.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
  pub fn new(message: impl Into<String>) -> Self {
    Self(message.into())
  }
}

impl From<&str> for ActionError {
  fn from(message: &str) -> Self {
    Self(message.to_string())
  }
}

impl From<String> for ActionError {
  fn from(message: String) -> Self {
    Self(message)
  }
}

/// Fatal fault inside the step loop. Caught at the run boundary and recorded on the
/// run record as `failed`; never propagates to the caller of the run entry points.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
  /// An edge or the start node referenced a node id the graph does not define.
  #[error("Node {0} not found")]
  NodeNotFound(String),
  /// A node referenced an action name the registry does not know.
  #[error("Tool {0} not found")]
  ActionNotFound(String),
  /// The invoked action raised.
  #[error("Action failed at node {node_id}: {source}")]
  ActionFailed {
    node_id: String,
    source: ActionError,
  },
}

/// Rejection from eager graph validation at the submission boundary.
#[derive(Debug, Clone, Error)]
pub enum GraphValidationError {
  #[error("start node {0} is not defined in the node list")]
  MissingStartNode(String),
  #[error("duplicate node id {0}")]
  DuplicateNodeId(String),
  #[error("edge {source_id} -> {target_id} references unknown node {unknown}")]
  DanglingEdge {
    source_id: String,
    target_id: String,
    unknown: String,
  },
}
