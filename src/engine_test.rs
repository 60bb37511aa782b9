//! Tests for the workflow step loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::engine::WorkflowEngine;
use crate::error::ActionError;
use crate::registry::{Action, ActionRegistry};
use crate::store::{InMemoryStore, RunStore};
use crate::types::{
  EdgeDefinition, GraphDefinition, NODE_CONFIG_KEY, NodeDefinition, RunConfig, RunState,
  RunStatus,
};

fn state(value: Value) -> RunState {
  value.as_object().unwrap().clone()
}

fn graph(start: &str, nodes: Vec<NodeDefinition>, edges: Vec<EdgeDefinition>) -> GraphDefinition {
  GraphDefinition {
    id: "g".to_string(),
    start_node_id: start.to_string(),
    nodes,
    edges,
  }
}

fn node(id: &str, action: &str) -> NodeDefinition {
  NodeDefinition::new(id, action)
}

fn noop(_state: &RunState) -> Result<Option<RunState>, ActionError> {
  Ok(None)
}

fn double_n(s: &RunState) -> Result<Option<RunState>, ActionError> {
  let n = s.get("n").and_then(Value::as_i64).unwrap_or(0);
  Ok(Some(state(json!({ "n": n * 2 }))))
}

fn increment_n(s: &RunState) -> Result<Option<RunState>, ActionError> {
  let n = s.get("n").and_then(Value::as_i64).unwrap_or(0);
  Ok(Some(state(json!({ "n": n + 1 }))))
}

fn set_x_1(_s: &RunState) -> Result<Option<RunState>, ActionError> {
  Ok(Some(state(json!({ "x": 1 }))))
}

fn set_x_2(_s: &RunState) -> Result<Option<RunState>, ActionError> {
  Ok(Some(state(json!({ "x": 2 }))))
}

fn boom(_s: &RunState) -> Result<Option<RunState>, ActionError> {
  Err(ActionError::new("boom"))
}

fn echo_config(s: &RunState) -> Result<Option<RunState>, ActionError> {
  let config = s.get(NODE_CONFIG_KEY).cloned().unwrap_or(Value::Null);
  let mut updates = RunState::new();
  updates.insert("seen_config".to_string(), config);
  Ok(Some(updates))
}

fn n_below_3(s: &RunState) -> bool {
  s.get("n").and_then(Value::as_i64).unwrap_or(0) < 3
}

fn always(_s: &RunState) -> bool {
  true
}

fn never(_s: &RunState) -> bool {
  false
}

struct SlowSetDone;

#[async_trait]
impl Action for SlowSetDone {
  async fn invoke(&self, _state: RunState) -> Result<Option<RunState>, ActionError> {
    tokio::time::sleep(Duration::from_millis(2)).await;
    Ok(Some(state(json!({ "done": true }))))
  }
}

fn fixture_registry() -> Arc<ActionRegistry> {
  let mut registry = ActionRegistry::new();
  registry.register_action("noop", noop);
  registry.register_action("double_n", double_n);
  registry.register_action("increment_n", increment_n);
  registry.register_action("set_x_1", set_x_1);
  registry.register_action("set_x_2", set_x_2);
  registry.register_action("boom", boom);
  registry.register_action("echo_config", echo_config);
  registry.register_action("slow_set_done", SlowSetDone);
  registry.register_condition("n_below_3", n_below_3);
  registry.register_condition("always", always);
  registry.register_condition("never", never);
  Arc::new(registry)
}

fn engine(graph: GraphDefinition, store: Arc<InMemoryStore>) -> WorkflowEngine {
  WorkflowEngine::new(graph, fixture_registry(), store)
}

fn log_node_ids(record: &crate::types::RunRecord) -> Vec<&str> {
  record
    .execution_log
    .iter()
    .map(|e| e.node_id.as_str())
    .collect()
}

#[tokio::test]
async fn node_without_edges_completes_after_one_step() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph("only", vec![node("only", "noop")], vec![]);
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  assert_eq!(record.status, RunStatus::Completed);
  assert_eq!(log_node_ids(&record), vec!["only"]);
}

#[tokio::test]
async fn linear_graph_threads_state_through_steps() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "start",
    vec![node("start", "noop"), node("double", "double_n")],
    vec![EdgeDefinition::new("start", "double")],
  );
  let record = engine(g, store)
    .run_blocking(state(json!({ "n": 3 })), RunConfig::default())
    .await;
  assert_eq!(record.status, RunStatus::Completed);
  assert_eq!(record.state["n"], json!(6));
  assert_eq!(log_node_ids(&record), vec!["start", "double"]);
}

#[tokio::test]
async fn conditioned_self_loop_runs_until_condition_fails() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "count_up",
    vec![node("count_up", "increment_n")],
    vec![EdgeDefinition::when("count_up", "count_up", "n_below_3").looping()],
  );
  let record = engine(g, store)
    .run_blocking(state(json!({ "n": 0 })), RunConfig::default())
    .await;
  assert_eq!(record.status, RunStatus::Completed);
  assert_eq!(record.state["n"], json!(3));
  assert_eq!(log_node_ids(&record), vec!["count_up", "count_up", "count_up"]);
}

#[tokio::test]
async fn iteration_cap_stops_run_but_reports_completed() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "spin",
    vec![node("spin", "increment_n")],
    vec![EdgeDefinition::new("spin", "spin").looping()],
  );
  let record = engine(g, store)
    .run_blocking(state(json!({ "n": 0 })), RunConfig::with_max_iterations(5))
    .await;
  assert_eq!(record.status, RunStatus::Completed);
  assert_eq!(record.execution_log.len(), 5);
  assert_eq!(record.state["n"], json!(5));
}

#[tokio::test]
async fn zero_iteration_budget_completes_with_empty_log() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph("only", vec![node("only", "noop")], vec![]);
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::with_max_iterations(0))
    .await;
  assert_eq!(record.status, RunStatus::Completed);
  assert!(record.execution_log.is_empty());
}

#[tokio::test]
async fn unresolved_action_fails_run_and_keeps_prior_steps() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "a",
    vec![node("a", "noop"), node("b", "missing_tool")],
    vec![EdgeDefinition::new("a", "b")],
  );
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  assert_eq!(record.status, RunStatus::Failed);
  assert_eq!(record.error.as_deref(), Some("Tool missing_tool not found"));
  assert_eq!(log_node_ids(&record), vec!["a"]);
}

#[tokio::test]
async fn edge_to_undefined_node_fails_run() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "a",
    vec![node("a", "noop")],
    vec![EdgeDefinition::new("a", "ghost")],
  );
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  assert_eq!(record.status, RunStatus::Failed);
  assert_eq!(record.error.as_deref(), Some("Node ghost not found"));
  assert_eq!(log_node_ids(&record), vec!["a"]);
}

#[tokio::test]
async fn action_fault_fails_run_with_description() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph("a", vec![node("a", "boom")], vec![]);
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  assert_eq!(record.status, RunStatus::Failed);
  assert_eq!(
    record.error.as_deref(),
    Some("Action failed at node a: boom")
  );
  assert!(record.execution_log.is_empty());
}

#[tokio::test]
async fn state_merge_is_last_write_wins_per_key() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "a",
    vec![node("a", "set_x_1"), node("b", "set_x_2")],
    vec![EdgeDefinition::new("a", "b")],
  );
  let record = engine(g, store)
    .run_blocking(state(json!({ "x": 0, "untouched": "keep" })), RunConfig::default())
    .await;
  assert_eq!(record.state["x"], json!(2));
  assert_eq!(record.state["untouched"], json!("keep"));
  // the intermediate snapshot saw the first write
  assert_eq!(record.execution_log[0].state_snapshot["x"], json!(1));
}

#[tokio::test]
async fn first_satisfied_edge_wins_even_if_later_edges_match() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "a",
    vec![node("a", "noop"), node("b", "noop"), node("c", "noop")],
    vec![
      EdgeDefinition::when("a", "b", "always"),
      EdgeDefinition::new("a", "c"),
    ],
  );
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  assert_eq!(log_node_ids(&record), vec!["a", "b"]);
}

#[tokio::test]
async fn unsatisfied_condition_falls_through_to_next_edge() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "a",
    vec![node("a", "noop"), node("b", "noop"), node("c", "noop")],
    vec![
      EdgeDefinition::when("a", "b", "never"),
      EdgeDefinition::new("a", "c"),
    ],
  );
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  assert_eq!(log_node_ids(&record), vec!["a", "c"]);
}

#[tokio::test]
async fn unregistered_condition_degrades_to_unsatisfied() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "a",
    vec![node("a", "noop"), node("b", "noop"), node("c", "noop")],
    vec![
      EdgeDefinition::when("a", "b", "not_registered"),
      EdgeDefinition::new("a", "c"),
    ],
  );
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  // the run is not failed; the gap only skips that edge
  assert_eq!(record.status, RunStatus::Completed);
  assert_eq!(log_node_ids(&record), vec!["a", "c"]);
}

#[tokio::test]
async fn node_config_is_injected_and_overwritten_each_step() {
  let store = Arc::new(InMemoryStore::new());
  let config_a = json!({ "who": "a" }).as_object().unwrap().clone();
  let config_b = json!({ "who": "b" }).as_object().unwrap().clone();
  let g = graph(
    "a",
    vec![
      node("a", "echo_config").with_config(config_a),
      node("b", "echo_config").with_config(config_b),
    ],
    vec![EdgeDefinition::new("a", "b")],
  );
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  assert_eq!(
    record.execution_log[0].state_snapshot["seen_config"]["who"],
    json!("a")
  );
  assert_eq!(record.state["seen_config"]["who"], json!("b"));
  assert_eq!(record.state[NODE_CONFIG_KEY]["who"], json!("b"));
}

#[tokio::test]
async fn async_action_is_awaited_before_next_step() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "slow",
    vec![node("slow", "slow_set_done"), node("after", "noop")],
    vec![EdgeDefinition::new("slow", "after")],
  );
  let record = engine(g, store)
    .run_blocking(RunState::new(), RunConfig::default())
    .await;
  assert_eq!(record.state["done"], json!(true));
  assert_eq!(log_node_ids(&record), vec!["slow", "after"]);
}

#[tokio::test]
async fn detached_run_record_is_visible_before_any_step() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph(
    "count_up",
    vec![node("count_up", "increment_n")],
    vec![EdgeDefinition::when("count_up", "count_up", "n_below_3").looping()],
  );
  let eng = engine(g, store.clone());
  let run_id = eng.run_detached(state(json!({ "n": 0 })), RunConfig::default());

  // spawned loop has not been polled yet on the current-thread test runtime
  let record = store.get_run(&run_id).unwrap();
  assert_eq!(record.status, RunStatus::Running);
  assert!(record.execution_log.is_empty());

  let mut finished = None;
  for _ in 0..200 {
    tokio::time::sleep(Duration::from_millis(1)).await;
    let record = store.get_run(&run_id).unwrap();
    if record.status != RunStatus::Running {
      finished = Some(record);
      break;
    }
  }
  let record = finished.expect("detached run should finish");
  assert_eq!(record.status, RunStatus::Completed);
  assert_eq!(record.state["n"], json!(3));
}

#[tokio::test]
async fn caller_supplied_run_id_is_used() {
  let store = Arc::new(InMemoryStore::new());
  let g = graph("only", vec![node("only", "noop")], vec![]);
  let eng = WorkflowEngine::with_run_id(g, "run-42", fixture_registry(), store.clone());
  assert_eq!(eng.run_id(), "run-42");
  let record = eng.run_blocking(RunState::new(), RunConfig::default()).await;
  assert_eq!(record.run_id, "run-42");
}

#[tokio::test]
async fn distinct_runs_do_not_share_state() {
  let store = Arc::new(InMemoryStore::new());
  let build = |store: Arc<InMemoryStore>| {
    engine(
      graph("inc", vec![node("inc", "increment_n")], vec![]),
      store,
    )
  };
  let first = build(store.clone())
    .run_blocking(state(json!({ "n": 10 })), RunConfig::default())
    .await;
  let second = build(store.clone())
    .run_blocking(state(json!({ "n": 100 })), RunConfig::default())
    .await;
  assert_eq!(first.state["n"], json!(11));
  assert_eq!(second.state["n"], json!(101));
  assert_ne!(first.run_id, second.run_id);
}
