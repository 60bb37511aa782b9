//! A directed, optionally-conditioned transition between two nodes.

use serde::{Deserialize, Serialize};

/// A directed transition between two nodes. Within a source node, edges are evaluated
/// in declared order and the first satisfied one wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDefinition {
  pub source_id: String,
  pub target_id: String,
  /// Lookup key into the condition registry; absent means always satisfied.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition_name: Option<String>,
  /// Informational only. Actual looping is structural: an edge whose target was
  /// already visited.
  #[serde(default, rename = "loop")]
  pub is_loop: bool,
}

impl EdgeDefinition {
  /// Unconditional edge (always satisfied).
  pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
    Self {
      source_id: source_id.into(),
      target_id: target_id.into(),
      condition_name: None,
      is_loop: false,
    }
  }

  /// Edge gated by a named condition.
  pub fn when(
    source_id: impl Into<String>,
    target_id: impl Into<String>,
    condition_name: impl Into<String>,
  ) -> Self {
    Self {
      source_id: source_id.into(),
      target_id: target_id.into(),
      condition_name: Some(condition_name.into()),
      is_loop: false,
    }
  }

  pub fn looping(mut self) -> Self {
    self.is_loop = true;
    self
  }
}
