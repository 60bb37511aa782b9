//! Workflow step loop: node execution, state merge, edge selection, run lifecycle.
//!
//! One engine instance drives exactly one run id. The loop is strictly sequential:
//! a single active node at a time, each action awaited to completion before the next
//! step. Every step writes the updated state and log through the [RunStore] contract
//! so a polling reader observes progress immediately.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::registry::ActionRegistry;
use crate::store::RunStore;
use crate::types::{
  EdgeDefinition, ExecutionLogEntry, GraphDefinition, NODE_CONFIG_KEY, NodeDefinition,
  RunConfig, RunRecord, RunState, RunUpdate,
};

/// Executes one run of a graph definition against an initial state.
///
/// Nodes are indexed by id and edges grouped by source (declared order preserved) at
/// construction; actions and conditions are resolved against the injected registry
/// once per step.
pub struct WorkflowEngine {
  run_id: String,
  start_node_id: String,
  nodes: HashMap<String, NodeDefinition>,
  edges_by_source: HashMap<String, Vec<EdgeDefinition>>,
  registry: Arc<ActionRegistry>,
  store: Arc<dyn RunStore>,
}

impl WorkflowEngine {
  /// Engine with a generated run id.
  pub fn new(
    graph: GraphDefinition,
    registry: Arc<ActionRegistry>,
    store: Arc<dyn RunStore>,
  ) -> Self {
    Self::with_run_id(graph, Uuid::new_v4().to_string(), registry, store)
  }

  /// Engine with a caller-supplied run id (must be globally unique).
  pub fn with_run_id(
    graph: GraphDefinition,
    run_id: impl Into<String>,
    registry: Arc<ActionRegistry>,
    store: Arc<dyn RunStore>,
  ) -> Self {
    let mut nodes = HashMap::new();
    for node in graph.nodes {
      nodes.insert(node.id.clone(), node);
    }
    let mut edges_by_source: HashMap<String, Vec<EdgeDefinition>> = HashMap::new();
    for edge in graph.edges {
      edges_by_source
        .entry(edge.source_id.clone())
        .or_default()
        .push(edge);
    }
    Self {
      run_id: run_id.into(),
      start_node_id: graph.start_node_id,
      nodes,
      edges_by_source,
      registry,
      store,
    }
  }

  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  /// Detached mode: saves the `running` run record synchronously, then hands the step
  /// loop to a background task and returns the run id without waiting for any step.
  /// A poll immediately after return always finds the record.
  pub fn run_detached(self, initial_state: RunState, config: RunConfig) -> String {
    let run_id = self.run_id.clone();
    self
      .store
      .save_run(RunRecord::new(&run_id, initial_state.clone()));
    tokio::spawn(async move {
      self.execute(initial_state, config).await;
    });
    run_id
  }

  /// Blocking mode: saves the run record, drives the step loop to a terminal status
  /// on the caller's own control flow, and returns the final record.
  pub async fn run_blocking(self, initial_state: RunState, config: RunConfig) -> RunRecord {
    let run_id = self.run_id.clone();
    self
      .store
      .save_run(RunRecord::new(&run_id, initial_state.clone()));
    self.execute(initial_state, config).await;
    self
      .store
      .get_run(&run_id)
      .expect("run record saved before execution")
  }

  /// Runs the step loop and records the terminal status. All step-loop faults are
  /// caught here and translated into a `failed` record; nothing escapes to the
  /// caller of the run entry points.
  #[instrument(level = "trace", skip(self, state, config), fields(run_id = %self.run_id))]
  async fn execute(&self, mut state: RunState, config: RunConfig) {
    match self.step_loop(&mut state, &config).await {
      Ok(steps) => {
        info!(run_id = %self.run_id, steps, "run completed");
        self.store.update_run(&self.run_id, RunUpdate::completed());
      }
      Err(err) => {
        error!(run_id = %self.run_id, error = %err, "run failed");
        self
          .store
          .update_run(&self.run_id, RunUpdate::failed(err.to_string()));
      }
    }
  }

  /// The step loop proper. Returns the number of steps taken, or the first fatal
  /// fault; state and log written up to that point are preserved as-is.
  async fn step_loop(&self, state: &mut RunState, config: &RunConfig) -> Result<u32, EngineError> {
    let mut log: Vec<ExecutionLogEntry> = Vec::new();
    let mut current_node_id = Some(self.start_node_id.clone());
    let mut steps = 0u32;

    while let Some(node_id) = current_node_id.take() {
      if steps >= config.max_iterations {
        // Budget exhausted mid-graph: the run stops here and is still recorded as
        // completed at whatever state it reached.
        warn!(run_id = %self.run_id, steps, "max iterations reached, stopping");
        break;
      }

      let node = self
        .nodes
        .get(&node_id)
        .ok_or_else(|| EngineError::NodeNotFound(node_id.clone()))?;
      let action = self
        .registry
        .resolve_action(&node.action_name)
        .ok_or_else(|| EngineError::ActionNotFound(node.action_name.clone()))?;

      state.insert(
        NODE_CONFIG_KEY.to_string(),
        Value::Object(node.config.clone()),
      );

      info!(run_id = %self.run_id, node_id = %node_id, "executing node");
      let start_ts = Utc::now();

      // The action sees an isolated deep copy; only its returned partial map touches
      // the canonical state. The merge is shallow: nested structures are replaced
      // wholesale, last write wins per key.
      let updates =
        action
          .invoke(state.clone())
          .await
          .map_err(|source| EngineError::ActionFailed {
            node_id: node_id.clone(),
            source,
          })?;
      if let Some(updates) = updates {
        for (key, value) in updates {
          state.insert(key, value);
        }
      }

      let end_ts = Utc::now();
      log.push(ExecutionLogEntry {
        node_id: node_id.clone(),
        start_ts,
        end_ts,
        state_snapshot: state.clone(),
      });
      self
        .store
        .update_run(&self.run_id, RunUpdate::progress(state.clone(), log.clone()));
      steps += 1;

      current_node_id = self.select_next(&node_id, state);
    }

    Ok(steps)
  }

  /// Evaluates outgoing edges in declared order against the post-merge state. An
  /// edge without a condition is satisfied; an unresolvable condition name degrades
  /// to unsatisfied with a warning. The first satisfied edge wins and the scan stops.
  /// `None` means no transition applies — the normal termination path.
  fn select_next(&self, node_id: &str, state: &RunState) -> Option<String> {
    let edges = self.edges_by_source.get(node_id)?;
    for edge in edges {
      let satisfied = match &edge.condition_name {
        None => true,
        Some(name) => match self.registry.resolve_condition(name) {
          Some(condition) => condition.evaluate(state),
          None => {
            warn!(
              run_id = %self.run_id,
              condition = %name,
              "condition not registered, treating edge as unsatisfied"
            );
            false
          }
        },
      };
      if satisfied {
        return Some(edge.target_id.clone());
      }
    }
    None
  }
}
