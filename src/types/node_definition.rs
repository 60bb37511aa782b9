//! A single computation step in a workflow graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single computation step, bound to a registered action by name. Immutable once
/// the graph is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
  /// Unique within the graph.
  pub id: String,
  /// Lookup key into the action registry.
  pub action_name: String,
  /// Static parameters visible only to this node's invocation (injected under
  /// [NODE_CONFIG_KEY](crate::types::NODE_CONFIG_KEY)).
  #[serde(default)]
  pub config: Map<String, Value>,
}

impl NodeDefinition {
  pub fn new(id: impl Into<String>, action_name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      action_name: action_name.into(),
      config: Map::new(),
    }
  }

  pub fn with_config(mut self, config: Map<String, Value>) -> Self {
    self.config = config;
    self
  }
}
