//! Rule-based text summarization: the built-in example workflow.
//!
//! Split → summarize → merge → refine, with a conditioned self-loop on refine that
//! keeps trimming until the summary fits `max_length`. All heuristics are plain
//! string rules (first sentence, drop the last sentence, hard truncate).

use serde_json::{Value, json};

use crate::error::ActionError;
use crate::registry::ActionRegistry;
use crate::types::{
  EdgeDefinition, GraphDefinition, NODE_CONFIG_KEY, NodeDefinition, RunState,
};

/// Graph id the built-in workflow is saved under.
pub const SUMMARIZATION_GRAPH_ID: &str = "summarization_workflow";

fn state_str<'a>(state: &'a RunState, key: &str) -> &'a str {
  state.get(key).and_then(Value::as_str).unwrap_or("")
}

fn max_length(state: &RunState) -> usize {
  state
    .get("max_length")
    .and_then(Value::as_u64)
    .unwrap_or(100) as usize
}

fn truncate_chars(s: &str, max: usize) -> String {
  s.chars().take(max).collect()
}

/// Splits `state.text` into fixed-size chunks. Chunk size comes from the node config
/// key `max_chunk_chars` (default 1000). Returns `{chunks: [...]}`.
pub fn split_text_to_chunks(state: &RunState) -> Result<Option<RunState>, ActionError> {
  let text = state_str(state, "text");
  let max_chars = state
    .get(NODE_CONFIG_KEY)
    .and_then(|c| c.get("max_chunk_chars"))
    .and_then(Value::as_u64)
    .unwrap_or(1000)
    .max(1) as usize;

  let chars: Vec<char> = text.chars().collect();
  let chunks: Vec<String> = chars
    .chunks(max_chars)
    .map(|c| c.iter().collect())
    .collect();

  let mut updates = RunState::new();
  updates.insert("chunks".to_string(), json!(chunks));
  Ok(Some(updates))
}

/// Summarizes each chunk by its first sentence. Returns `{summaries: [...]}`.
pub fn summarize_chunk_rule_based(state: &RunState) -> Result<Option<RunState>, ActionError> {
  let chunks = state
    .get("chunks")
    .and_then(Value::as_array)
    .cloned()
    .unwrap_or_default();

  let summaries: Vec<String> = chunks
    .iter()
    .map(|chunk| {
      let chunk = chunk.as_str().unwrap_or("");
      let first = chunk.split('.').next().unwrap_or("");
      format!("{first}.")
    })
    .collect();

  let mut updates = RunState::new();
  updates.insert("summaries".to_string(), json!(summaries));
  Ok(Some(updates))
}

/// Joins all chunk summaries into `{merged_summary}`.
pub fn merge_summaries(state: &RunState) -> Result<Option<RunState>, ActionError> {
  let summaries = state
    .get("summaries")
    .and_then(Value::as_array)
    .cloned()
    .unwrap_or_default();

  let merged = summaries
    .iter()
    .map(|s| s.as_str().unwrap_or(""))
    .collect::<Vec<_>>()
    .join(" ");

  let mut updates = RunState::new();
  updates.insert("merged_summary".to_string(), json!(merged));
  Ok(Some(updates))
}

/// Shortens the working summary toward `state.max_length`: drop the last sentence if
/// there is more than one, otherwise hard-truncate. Designed to be self-looped until
/// [summary_length_above_limit] turns false. Returns `{final_summary}`.
pub fn refine_summary(state: &RunState) -> Result<Option<RunState>, ActionError> {
  let current = match state_str(state, "final_summary") {
    "" => state_str(state, "merged_summary"),
    s => s,
  };
  let max = max_length(state);

  let mut updates = RunState::new();
  if current.chars().count() <= max {
    updates.insert("final_summary".to_string(), json!(current));
    return Ok(Some(updates));
  }

  let sentences: Vec<&str> = current.split('.').collect();
  let mut refined = if sentences.len() > 1 {
    let real: Vec<&str> = sentences
      .iter()
      .copied()
      .filter(|s| !s.trim().is_empty())
      .collect();
    if real.len() > 1 {
      format!("{}.", real[..real.len() - 1].join("."))
    } else {
      truncate_chars(current, max)
    }
  } else {
    truncate_chars(current, max)
  };

  if refined.chars().count() > max {
    refined = truncate_chars(&refined, max);
  }

  updates.insert("final_summary".to_string(), json!(refined));
  Ok(Some(updates))
}

/// True when `state.final_summary` fits within `state.max_length` (default 100).
pub fn summary_length_below_limit(state: &RunState) -> bool {
  state_str(state, "final_summary").chars().count() <= max_length(state)
}

/// Negation of [summary_length_below_limit]; gates the refine self-loop.
pub fn summary_length_above_limit(state: &RunState) -> bool {
  !summary_length_below_limit(state)
}

/// Registers the summarization actions and conditions under their canonical names.
pub fn register_builtins(registry: &mut ActionRegistry) {
  registry.register_action("split_text_to_chunks", split_text_to_chunks);
  registry.register_action("summarize_chunk_rule_based", summarize_chunk_rule_based);
  registry.register_action("merge_summaries", merge_summaries);
  registry.register_action("refine_summary", refine_summary);
  registry.register_condition("summary_length_below_limit", summary_length_below_limit);
  registry.register_condition("summary_length_above_limit", summary_length_above_limit);
}

/// The built-in summarization graph: split → summarize → merge → refine, with a
/// conditioned self-loop on refine. When the loop condition is unmet no edge matches
/// and the run terminates normally.
pub fn summarization_graph() -> GraphDefinition {
  let mut split_config = serde_json::Map::new();
  split_config.insert("max_chunk_chars".to_string(), json!(50));

  GraphDefinition {
    id: SUMMARIZATION_GRAPH_ID.to_string(),
    start_node_id: "split_text".to_string(),
    nodes: vec![
      NodeDefinition::new("split_text", "split_text_to_chunks").with_config(split_config),
      NodeDefinition::new("summarize_chunks", "summarize_chunk_rule_based"),
      NodeDefinition::new("merge_summaries", "merge_summaries"),
      NodeDefinition::new("refine_final_summary", "refine_summary"),
    ],
    edges: vec![
      EdgeDefinition::new("split_text", "summarize_chunks"),
      EdgeDefinition::new("summarize_chunks", "merge_summaries"),
      EdgeDefinition::new("merge_summaries", "refine_final_summary"),
      EdgeDefinition::when(
        "refine_final_summary",
        "refine_final_summary",
        "summary_length_above_limit",
      )
      .looping(),
    ],
  }
}
