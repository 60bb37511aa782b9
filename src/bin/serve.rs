//! HTTP service entry point for the graphrun workflow engine.
//!
//! Builds the action registry (with the built-in summarization actions), pre-loads
//! the example summarization graph, and serves the create/run/inspect API.
//!
//! Usage: `serve [--addr 127.0.0.1:8000]`
//!
//! Set RUST_LOG=graphrun=trace for TRACE-level span enter/exit and events.

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use clap::Parser;
use graphrun::registry::ActionRegistry;
use graphrun::server::{AppState, router};
use graphrun::store::{GraphStore, InMemoryStore};
use graphrun::summarize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Serve the workflow engine API.
#[derive(Parser, Debug)]
#[command(name = "serve")]
struct Args {
  /// Socket address to bind.
  #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8000")]
  addr: SocketAddr,
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .init();

  let args = Args::parse();

  let mut registry = ActionRegistry::new();
  summarize::register_builtins(&mut registry);

  let store = Arc::new(InMemoryStore::new());
  store.save_graph(summarize::summarization_graph());

  let state = Arc::new(AppState {
    registry: Arc::new(registry),
    store,
  });

  let listener = match tokio::net::TcpListener::bind(args.addr).await {
    Ok(listener) => listener,
    Err(e) => {
      eprintln!("failed to bind {}: {e}", args.addr);
      process::exit(1);
    }
  };

  info!(addr = %args.addr, "graphrun serving");
  if let Err(e) = axum::serve(listener, router(state)).await {
    eprintln!("server error: {e}");
    process::exit(1);
  }
}
