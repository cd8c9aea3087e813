//! Goal Routes
//!
//! - GET|POST /api/goals/
//! - GET|PUT|DELETE /api/goals/:id
//! - GET /api/goals/:id/tasks

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::deleted;
use crate::api::{Backend, DeleteResponse};
use crate::mock_server::error::{MockResult, MockServerError};
use crate::mock_server::state::MockState;
use crate::model::{CreateGoal, Goal, Task, UpdateGoal};

pub async fn list_goals(State(state): State<Arc<MockState>>) -> MockResult<Json<Vec<Goal>>> {
    Ok(Json(state.backend.list_goals().await?))
}

pub async fn get_goal(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<Goal>> {
    state
        .backend
        .get_goal(&id)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found("Goal"))
}

pub async fn create_goal(
    State(state): State<Arc<MockState>>,
    Json(payload): Json<CreateGoal>,
) -> MockResult<(StatusCode, Json<Goal>)> {
    let goal = state.backend.create_goal(&payload).await?;
    tracing::info!(goal_id = %goal.id, project_id = %goal.project_id, "Created goal");
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn update_goal(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGoal>,
) -> MockResult<Json<Goal>> {
    state
        .backend
        .update_goal(&id, &payload)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found("Goal"))
}

pub async fn delete_goal(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<DeleteResponse>> {
    deleted(state.backend.delete_goal(&id).await?, "Goal")
}

/// Serves both `/goals/:id/tasks` and `/tasks/goal/:id`
pub async fn goal_tasks(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<Vec<Task>>> {
    if state.backend.get_goal(&id).await?.is_none() {
        return Err(MockServerError::not_found("Goal"));
    }
    Ok(Json(state.backend.goal_tasks(&id).await?))
}
