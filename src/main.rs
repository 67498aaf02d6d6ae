// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! MindCare API Server
//!
//! Serves the guided-activity catalog and drives step-by-step runs,
//! granting points and achievements when a user finishes an activity.

use mindcare::{
    config::{Config, StorageBackend},
    db::{FirestoreDb, MemoryStore, ProgressStore},
    services::{ActivityCatalog, RunRegistry},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often abandoned runs are swept.
const RUN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting MindCare API");

    // Load the activity catalog
    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading activity catalog");
            ActivityCatalog::load_from_file(path)?
        }
        None => ActivityCatalog::builtin()?.clone(),
    };

    // Initialize the progress store
    let store: Arc<dyn ProgressStore> = match config.storage_backend {
        StorageBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; progress is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        catalog,
        runs: RunRegistry::new(),
    });

    spawn_run_sweeper(state.clone());

    // Build router
    let app = mindcare::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drop runs that were started but never finished.
fn spawn_run_sweeper(state: Arc<AppState>) {
    let ttl = chrono::Duration::minutes(state.config.run_ttl_minutes);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RUN_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let pruned = state.runs.prune_older_than(ttl);
            if pruned > 0 {
                tracing::info!(pruned, remaining = state.runs.len(), "Swept stale runs");
            }
        }
    });
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mindcare=debug,info")),
        )
        .with(format)
        .init();
}
