//! Per-execution run record: status, current state, ordered execution log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RunState;

/// Lifecycle status of a run. `Running` is entered exactly once at record creation;
/// the only transitions are to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
  Running,
  Completed,
  Failed,
}

impl fmt::Display for RunStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunStatus::Running => write!(f, "running"),
      RunStatus::Completed => write!(f, "completed"),
      RunStatus::Failed => write!(f, "failed"),
    }
  }
}

/// One recorded node execution. Append-only; looped nodes appear once per pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
  pub node_id: String,
  pub start_ts: DateTime<Utc>,
  pub end_ts: DateTime<Utc>,
  /// Deep copy of state immediately after the step's merge.
  pub state_snapshot: RunState,
}

/// Mutable per-execution record. Created with status `running` and an empty log,
/// updated after every step, and retained for inspection until the surrounding
/// service evicts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
  pub run_id: String,
  pub status: RunStatus,
  pub state: RunState,
  pub execution_log: Vec<ExecutionLogEntry>,
  /// Present only when status is `failed`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl RunRecord {
  pub fn new(run_id: impl Into<String>, state: RunState) -> Self {
    Self {
      run_id: run_id.into(),
      status: RunStatus::Running,
      state,
      execution_log: Vec::new(),
      error: None,
    }
  }
}

/// Partial update merged into a stored run record; `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct RunUpdate {
  pub status: Option<RunStatus>,
  pub state: Option<RunState>,
  pub execution_log: Option<Vec<ExecutionLogEntry>>,
  pub error: Option<String>,
}

impl RunUpdate {
  /// Post-step update: new canonical state plus the log so far.
  pub fn progress(state: RunState, execution_log: Vec<ExecutionLogEntry>) -> Self {
    Self {
      state: Some(state),
      execution_log: Some(execution_log),
      ..Self::default()
    }
  }

  pub fn completed() -> Self {
    Self {
      status: Some(RunStatus::Completed),
      ..Self::default()
    }
  }

  pub fn failed(error: impl Into<String>) -> Self {
    Self {
      status: Some(RunStatus::Failed),
      error: Some(error.into()),
      ..Self::default()
    }
  }

  /// Merges into `record`, last-writer-wins per field.
  pub fn apply(self, record: &mut RunRecord) {
    if let Some(status) = self.status {
      record.status = status;
    }
    if let Some(state) = self.state {
      record.state = state;
    }
    if let Some(log) = self.execution_log {
      record.execution_log = log;
    }
    if let Some(error) = self.error {
      record.error = Some(error);
    }
  }
}
