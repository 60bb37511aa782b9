//! # graphrun
//!
//! Workflow-as-data graph engine. Graphs are submitted as data, not code: nodes
//! reference named actions resolved at run time from a registry, and edges reference
//! named boolean predicates that gate transitions (including self-loops for
//! iterative refinement). A shared state map threads through each step until no
//! transition applies or the step budget runs out.
//!
//! ## Architecture
//!
//! [ActionRegistry] maps names to actions and conditions; [WorkflowEngine] walks the
//! graph one node at a time and writes every step through the [store] contract;
//! `server` exposes the create/run/inspect HTTP boundary; `summarize` ships the
//! built-in rule-based summarization workflow.

pub mod engine;
#[cfg(test)]
mod engine_test;
pub mod error;
pub mod registry;
pub mod server;
pub mod store;
pub mod summarize;
pub mod types;

pub use engine::WorkflowEngine;
pub use error::{ActionError, EngineError, GraphValidationError};
pub use registry::{Action, ActionRegistry, Condition};
pub use store::{GraphStore, InMemoryStore, RunStore};
pub use types::{
  EdgeDefinition, GraphDefinition, NodeDefinition, RunConfig, RunMode, RunRecord,
  RunState, RunStatus,
};
