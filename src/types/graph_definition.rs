//! Immutable description of a workflow graph: nodes, edges, start node.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::GraphValidationError;

use super::{EdgeDefinition, NodeDefinition};

/// Immutable description of a workflow graph, submitted by a caller as data.
/// Node and edge order is preserved; per-source edge order is significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDefinition {
  pub id: String,
  pub start_node_id: String,
  pub nodes: Vec<NodeDefinition>,
  pub edges: Vec<EdgeDefinition>,
}

impl GraphDefinition {
  pub fn node(&self, node_id: &str) -> Option<&NodeDefinition> {
    self.nodes.iter().find(|n| n.id == node_id)
  }

  /// Outgoing edges of `node_id` in declared order.
  pub fn outgoing_edges(&self, node_id: &str) -> Vec<&EdgeDefinition> {
    self
      .edges
      .iter()
      .filter(|e| e.source_id == node_id)
      .collect()
  }

  /// Eager structural checks applied at the submission boundary: the start node and
  /// every edge endpoint must exist, and node ids must be unique. The engine itself
  /// still discovers dangling references at run time, so graphs built in-process
  /// without passing through [validate](Self::validate) behave as before.
  pub fn validate(&self) -> Result<(), GraphValidationError> {
    let mut ids: HashSet<&str> = HashSet::new();
    for node in &self.nodes {
      if !ids.insert(node.id.as_str()) {
        return Err(GraphValidationError::DuplicateNodeId(node.id.clone()));
      }
    }
    if !ids.contains(self.start_node_id.as_str()) {
      return Err(GraphValidationError::MissingStartNode(
        self.start_node_id.clone(),
      ));
    }
    for edge in &self.edges {
      for endpoint in [&edge.source_id, &edge.target_id] {
        if !ids.contains(endpoint.as_str()) {
          return Err(GraphValidationError::DanglingEdge {
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
            unknown: endpoint.clone(),
          });
        }
      }
    }
    Ok(())
  }
}
