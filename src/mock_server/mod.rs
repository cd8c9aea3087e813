//! Event Horizon Mock REST Server
//!
//! Axum server exposing a [`MemoryBackend`] under the same REST contract as
//! the real service, for local development and end-to-end tests.
//!
//! # Endpoints
//!
//! All resource routes live under `/api` (see [`crate::api`] for the
//! contract). Health checks:
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Status with record counts
//!
//! # Example
//!
//! ```rust,ignore
//! use event_horizon::api::MemoryBackend;
//! use event_horizon::mock_server::{seed_demo_data, serve, MockState};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! seed_demo_data(&backend).await?;
//! serve(MockState::new(backend), "127.0.0.1:8000").await?;
//! ```

pub mod error;
pub mod routes;
mod seed;
mod state;

pub use error::{MockResult, MockServerError};
pub use seed::seed_demo_data;
pub use state::MockState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Maximum accepted request body (attachments included)
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the mock server router with all routes and middleware
pub fn build_router(state: MockState) -> Router {
    use routes::{dependencies, goals, knowledge, projects, tasks};

    let api_routes = Router::new()
        // Projects
        .route("/projects/", get(projects::list_projects).post(projects::create_project))
        .route(
            "/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/projects/:id/goals", get(projects::project_goals))
        // Goals
        .route("/goals/", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/goals/:id",
            get(goals::get_goal).put(goals::update_goal).delete(goals::delete_goal),
        )
        .route("/goals/:id/tasks", get(goals::goal_tasks))
        // Tasks
        .route("/tasks/", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/tasks/:id/status", patch(tasks::update_task_status))
        .route("/tasks/goal/:id", get(goals::goal_tasks))
        // Knowledge base
        .route("/knowledge/", get(knowledge::list_knowledge).post(knowledge::create_knowledge))
        .route(
            "/knowledge/:id",
            get(knowledge::get_knowledge)
                .put(knowledge::update_knowledge)
                .delete(knowledge::delete_knowledge),
        )
        .route("/knowledge/project/:id", get(knowledge::knowledge_for_project))
        .route("/knowledge/goal/:id", get(knowledge::knowledge_for_goal))
        .route("/knowledge/task/:id", get(knowledge::knowledge_for_task))
        .route("/knowledge/:id/references", post(knowledge::add_reference))
        .route(
            "/knowledge/:id/references/:kind/:entity_id",
            delete(knowledge::remove_reference),
        )
        .route("/knowledge/:id/upload", post(knowledge::upload_attachment))
        .route("/knowledge/:id/download", get(knowledge::download_attachment))
        .route("/knowledge/:id/attachment", delete(knowledge::delete_attachment))
        // Task dependencies
        .route(
            "/task-dependencies/",
            get(dependencies::list_dependencies).post(dependencies::add_dependency),
        )
        .route(
            "/task-dependencies/:task_id/:depends_on_task_id",
            delete(dependencies::remove_dependency),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM
pub async fn serve(state: MockState, addr: &str) -> MockResult<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Event Horizon mock API listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Mock API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
