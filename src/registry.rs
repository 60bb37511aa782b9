//! Named action and condition registry, resolved by the engine once per step.
//!
//! The registry is an explicit object built once at process start and injected into
//! the engine, never a process-wide global. Registration happens before any graph is
//! executed and is never concurrent with execution, so re-registering a name simply
//! replaces the prior binding.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::types::RunState;

/// A registered step function.
///
/// Invoked with an isolated deep copy of the run state (the node's static config is
/// under [NODE_CONFIG_KEY](crate::types::NODE_CONFIG_KEY)). Returning `Some(map)`
/// shallow-merges those keys into the canonical state, overwriting existing keys;
/// `None` leaves the state untouched. The engine awaits completion before moving on,
/// so implementations may be plain computations or genuinely async.
#[async_trait]
pub trait Action: Send + Sync {
  async fn invoke(&self, state: RunState) -> Result<Option<RunState>, ActionError>;
}

/// A registered predicate over state deciding edge eligibility. Must be pure with
/// respect to state; the engine does not guard against side effects.
pub trait Condition: Send + Sync {
  fn evaluate(&self, state: &RunState) -> bool;
}

#[async_trait]
impl<F> Action for F
where
  F: Fn(&RunState) -> Result<Option<RunState>, ActionError> + Send + Sync,
{
  async fn invoke(&self, state: RunState) -> Result<Option<RunState>, ActionError> {
    self(&state)
  }
}

impl<F> Condition for F
where
  F: Fn(&RunState) -> bool + Send + Sync,
{
  fn evaluate(&self, state: &RunState) -> bool {
    self(state)
  }
}

/// Name → action and name → condition mappings. The two namespaces are independent;
/// last registration wins within each.
#[derive(Default)]
pub struct ActionRegistry {
  actions: HashMap<String, Arc<dyn Action>>,
  conditions: HashMap<String, Arc<dyn Condition>>,
}

impl ActionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register_action(&mut self, name: impl Into<String>, action: impl Action + 'static) {
    self.actions.insert(name.into(), Arc::new(action));
  }

  pub fn register_condition(
    &mut self,
    name: impl Into<String>,
    condition: impl Condition + 'static,
  ) {
    self.conditions.insert(name.into(), Arc::new(condition));
  }

  pub fn resolve_action(&self, name: &str) -> Option<Arc<dyn Action>> {
    self.actions.get(name).cloned()
  }

  pub fn resolve_condition(&self, name: &str) -> Option<Arc<dyn Condition>> {
    self.conditions.get(name).cloned()
  }

  /// Registered action names, sorted for stable output.
  pub fn list_actions(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  /// Registered condition names, sorted for stable output.
  pub fn list_conditions(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.conditions.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }
}
