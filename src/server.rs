//! HTTP surface over the engine: create/run/inspect endpoints.
//!
//! Run failure is a normal outcome surfaced as `status: failed` in a 200 response;
//! only boundary misuse (unknown ids, duplicate graph, bad run mode, malformed
//! graph) is rejected.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::engine::WorkflowEngine;
use crate::error::GraphValidationError;
use crate::registry::ActionRegistry;
use crate::store::{GraphStore, InMemoryStore, RunStore};
use crate::types::{GraphDefinition, RunMode, RunRequest, RunResponse};

/// Shared service state: the action registry and the backing store.
pub struct AppState {
  pub registry: Arc<ActionRegistry>,
  pub store: Arc<InMemoryStore>,
}

/// Boundary misuse, each condition distinct and user-facing.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Graph {0} not found")]
  GraphNotFound(String),
  #[error("Run {0} not found")]
  RunNotFound(String),
  #[error("Graph {0} already exists")]
  DuplicateGraph(String),
  #[error("Invalid run_mode {0:?}. Use 'sync' or 'async'")]
  InvalidRunMode(String),
  #[error("Invalid graph: {0}")]
  InvalidGraph(#[from] GraphValidationError),
}

impl ApiError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      ApiError::GraphNotFound(_) | ApiError::RunNotFound(_) => StatusCode::NOT_FOUND,
      ApiError::DuplicateGraph(_) | ApiError::InvalidRunMode(_) | ApiError::InvalidGraph(_) => {
        StatusCode::BAD_REQUEST
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = Json(json!({ "detail": self.to_string() }));
    (self.status_code(), body).into_response()
  }
}

/// Builds the service router.
pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/", get(root))
    .route("/graph/create", post(create_graph))
    .route("/graph/run", post(run_graph))
    .route("/graph/state/:run_id", get(get_run_state))
    .route("/graph/:graph_id", get(get_graph))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn root() -> Json<Value> {
  Json(json!({
    "message": "graphrun workflow engine",
    "endpoints": ["/graph/create", "/graph/run", "/graph/state/{run_id}", "/graph/{graph_id}"]
  }))
}

async fn create_graph(
  State(state): State<Arc<AppState>>,
  Json(definition): Json<GraphDefinition>,
) -> Result<Json<Value>, ApiError> {
  definition.validate()?;
  if state.store.get_graph(&definition.id).is_some() {
    return Err(ApiError::DuplicateGraph(definition.id));
  }
  let graph_id = definition.id.clone();
  state.store.save_graph(definition);
  Ok(Json(json!({ "graph_id": graph_id })))
}

async fn run_graph(
  State(state): State<Arc<AppState>>,
  Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
  let graph = state
    .store
    .get_graph(&request.graph_id)
    .ok_or_else(|| ApiError::GraphNotFound(request.graph_id.clone()))?;
  let mode: RunMode = request
    .run_mode
    .parse()
    .map_err(|_| ApiError::InvalidRunMode(request.run_mode.clone()))?;

  let run_store: Arc<dyn RunStore> = state.store.clone();
  let engine = WorkflowEngine::new(graph, Arc::clone(&state.registry), run_store);

  match mode {
    RunMode::Async => {
      let run_id = engine.run_detached(request.initial_state, request.config);
      Ok(Json(RunResponse::running(run_id)))
    }
    RunMode::Sync => {
      let record = engine
        .run_blocking(request.initial_state, request.config)
        .await;
      Ok(Json(RunResponse::from(record)))
    }
  }
}

async fn get_run_state(
  State(state): State<Arc<AppState>>,
  Path(run_id): Path<String>,
) -> Result<Json<RunResponse>, ApiError> {
  let record = state
    .store
    .get_run(&run_id)
    .ok_or(ApiError::RunNotFound(run_id))?;
  Ok(Json(RunResponse::from(record)))
}

async fn get_graph(
  State(state): State<Arc<AppState>>,
  Path(graph_id): Path<String>,
) -> Result<Json<GraphDefinition>, ApiError> {
  let graph = state
    .store
    .get_graph(&graph_id)
    .ok_or(ApiError::GraphNotFound(graph_id))?;
  Ok(Json(graph))
}
