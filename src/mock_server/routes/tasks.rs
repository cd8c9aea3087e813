//! Task Routes
//!
//! - GET|POST /api/tasks/
//! - GET|PUT|DELETE /api/tasks/:id
//! - PATCH /api/tasks/:id/status - Change status, stamping or clearing the completion date

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
use crate::model::{CreateTask, StatusPatch, Task, UpdateTask};

pub async fn list_tasks(State(state): State<Arc<MockState>>) -> MockResult<Json<Vec<Task>>> {
    Ok(Json(state.backend.list_tasks().await?))
}

pub async fn get_task(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<Task>> {
    state
        .backend
        .get_task(&id)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found("Task"))
}

pub async fn create_task(
    State(state): State<Arc<MockState>>,
    Json(payload): Json<CreateTask>,
) -> MockResult<(StatusCode, Json<Task>)> {
    let task = state.backend.create_task(&payload).await?;
    tracing::info!(task_id = %task.id, goal_id = %task.goal_id, "Created task");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTask>,
) -> MockResult<Json<Task>> {
    state
        .backend
        .update_task(&id, &payload)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found("Task"))
}

pub async fn update_task_status(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(patch): Json<StatusPatch>,
) -> MockResult<Json<Task>> {
    let task = state
        .backend
        .update_task_status(&id, patch.status)
        .await?
        .ok_or_else(|| MockServerError::not_found("Task"))?;
    tracing::info!(task_id = %task.id, status = %task.status, "Task status changed");
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<DeleteResponse>> {
    deleted(state.backend.delete_task(&id).await?, "Task")
}
