//! Workflow graph, run, and request types shared by the engine and the HTTP surface.
//!
//! Graphs are pure data: nodes name actions and edges name conditions, both resolved
//! against an [ActionRegistry](crate::registry::ActionRegistry) at run time.

use serde_json::{Map, Value};

mod edge_definition;
mod graph_definition;
mod node_definition;
mod run_record;
mod run_request;

pub use edge_definition::EdgeDefinition;
pub use graph_definition::GraphDefinition;
pub use node_definition::NodeDefinition;
pub use run_record::{ExecutionLogEntry, RunRecord, RunStatus, RunUpdate};
pub use run_request::{DEFAULT_MAX_ITERATIONS, RunConfig, RunMode, RunRequest, RunResponse};

/// Shared key-value working set threaded through a run. Keys are strings, values are
/// arbitrary JSON; a clone is a deep copy.
pub type RunState = Map<String, Value>;

/// Reserved state key carrying the current node's static config into its action.
/// Overwritten before every step; not part of the persistent state contract.
pub const NODE_CONFIG_KEY: &str = "_node_config";
