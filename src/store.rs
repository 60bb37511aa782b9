//! Run and graph persistence behind a narrow key-value contract.
//!
//! The engine only ever needs `save_run`/`get_run`/`update_run`; a real deployment is
//! free to back the contract with any durable store. Exactly one executor writes a
//! given run id, so last-writer-wins is sufficient. Writes are observable by readers
//! (e.g. a status-polling caller) as soon as they return.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::{GraphDefinition, RunRecord, RunUpdate};

/// Persistence contract for run records.
pub trait RunStore: Send + Sync {
  fn save_run(&self, record: RunRecord);
  fn get_run(&self, run_id: &str) -> Option<RunRecord>;
  /// Partial merge into an existing record. Unknown id is a no-op.
  fn update_run(&self, run_id: &str, update: RunUpdate);
}

/// Persistence contract for submitted graph definitions.
pub trait GraphStore: Send + Sync {
  fn save_graph(&self, graph: GraphDefinition);
  fn get_graph(&self, graph_id: &str) -> Option<GraphDefinition>;
}

/// In-memory store over `RwLock<HashMap>`; the reference implementation of both
/// contracts.
#[derive(Default)]
pub struct InMemoryStore {
  runs: RwLock<HashMap<String, RunRecord>>,
  graphs: RwLock<HashMap<String, GraphDefinition>>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl RunStore for InMemoryStore {
  fn save_run(&self, record: RunRecord) {
    let mut runs = self.runs.write().expect("run store lock poisoned");
    runs.insert(record.run_id.clone(), record);
  }

  fn get_run(&self, run_id: &str) -> Option<RunRecord> {
    let runs = self.runs.read().expect("run store lock poisoned");
    runs.get(run_id).cloned()
  }

  fn update_run(&self, run_id: &str, update: RunUpdate) {
    let mut runs = self.runs.write().expect("run store lock poisoned");
    if let Some(record) = runs.get_mut(run_id) {
      update.apply(record);
    }
  }
}

impl GraphStore for InMemoryStore {
  fn save_graph(&self, graph: GraphDefinition) {
    let mut graphs = self.graphs.write().expect("graph store lock poisoned");
    graphs.insert(graph.id.clone(), graph);
  }

  fn get_graph(&self, graph_id: &str) -> Option<GraphDefinition> {
    let graphs = self.graphs.read().expect("graph store lock poisoned");
    graphs.get(graph_id).cloned()
  }
}
