//! Run submission and response DTOs for the service boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ExecutionLogEntry, RunRecord, RunState, RunStatus};

/// Default step budget when the caller does not override `max_iterations`.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// How a run is invoked: awaited to completion on the caller's control flow, or
/// detached into a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
  Sync,
  Async,
}

impl FromStr for RunMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "sync" => Ok(RunMode::Sync),
      "async" => Ok(RunMode::Async),
      other => Err(format!("invalid run_mode: {other}")),
    }
  }
}

impl fmt::Display for RunMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunMode::Sync => write!(f, "sync"),
      RunMode::Async => write!(f, "async"),
    }
  }
}

fn default_max_iterations() -> u32 {
  DEFAULT_MAX_ITERATIONS
}

/// Per-run execution options supplied at submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
  /// Step budget; the run stops once reached (still recorded as `completed`).
  #[serde(default = "default_max_iterations")]
  pub max_iterations: u32,
  /// Caller-defined keys, carried through untouched.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      max_iterations: DEFAULT_MAX_ITERATIONS,
      extra: Map::new(),
    }
  }
}

impl RunConfig {
  pub fn with_max_iterations(max_iterations: u32) -> Self {
    Self {
      max_iterations,
      ..Self::default()
    }
  }
}

fn default_run_mode() -> String {
  "async".to_string()
}

/// Run submission: which graph, initial state, invocation mode, per-run config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
  pub graph_id: String,
  #[serde(default)]
  pub initial_state: RunState,
  /// `sync` or `async`; anything else is rejected at the boundary, so this stays a
  /// raw string until the handler parses it into [RunMode].
  #[serde(default = "default_run_mode")]
  pub run_mode: String,
  #[serde(default)]
  pub config: RunConfig,
}

/// Caller-visible view of a run. For a freshly detached run only `run_id` and
/// `status` are populated; a completed or polled run carries the full record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
  pub run_id: String,
  pub status: RunStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub state: Option<RunState>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execution_log: Option<Vec<ExecutionLogEntry>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl RunResponse {
  /// Response for a detached run that has just been scheduled.
  pub fn running(run_id: impl Into<String>) -> Self {
    Self {
      run_id: run_id.into(),
      status: RunStatus::Running,
      state: None,
      execution_log: None,
      error: None,
    }
  }
}

impl From<RunRecord> for RunResponse {
  fn from(record: RunRecord) -> Self {
    Self {
      run_id: record.run_id,
      status: record.status,
      state: Some(record.state),
      execution_log: Some(record.execution_log),
      error: record.error,
    }
  }
}
