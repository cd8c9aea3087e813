//! Health Routes
//!
//! - GET /health/live - Liveness probe
//! - GET /health - Status with record counts

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::Backend;
use crate::mock_server::error::MockResult;
use crate::mock_server::state::MockState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub projects: usize,
    pub goals: usize,
    pub tasks: usize,
    pub knowledge: usize,
    pub uptime_seconds: u64,
    pub version: &'static str,
}

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
pub async fn full_health(State(state): State<Arc<MockState>>) -> MockResult<Json<HealthResponse>> {
    let backend = &state.backend;
    Ok(Json(HealthResponse {
        status: "healthy",
        projects: backend.list_projects().await?.len(),
        goals: backend.list_goals().await?.len(),
        tasks: backend.list_tasks().await?.len(),
        knowledge: backend.list_knowledge().await?.len(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        assert_eq!(liveness().await, StatusCode::OK);
    }
}
