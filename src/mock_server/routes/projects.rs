//! Project Routes
//!
//! - GET /api/projects/ - List projects
//! - POST /api/projects/ - Create a project
//! - GET /api/projects/:id - Get a project
//! - PUT /api/projects/:id - Update a project
//! - DELETE /api/projects/:id - Delete a project with its goals and tasks
//! - GET /api/projects/:id/goals - Goals of a project

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
use crate::model::{CreateProject, Goal, Project, UpdateProject};

pub async fn list_projects(State(state): State<Arc<MockState>>) -> MockResult<Json<Vec<Project>>> {
    Ok(Json(state.backend.list_projects().await?))
}

pub async fn get_project(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<Project>> {
    state
        .backend
        .get_project(&id)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found("Project"))
}

pub async fn create_project(
    State(state): State<Arc<MockState>>,
    Json(payload): Json<CreateProject>,
) -> MockResult<(StatusCode, Json<Project>)> {
    let project = state.backend.create_project(&payload).await?;
    tracing::info!(project_id = %project.id, name = %project.name, "Created project");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProject>,
) -> MockResult<Json<Project>> {
    state
        .backend
        .update_project(&id, &payload)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found("Project"))
}

pub async fn delete_project(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<DeleteResponse>> {
    deleted(state.backend.delete_project(&id).await?, "Project")
}

pub async fn project_goals(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<Vec<Goal>>> {
    if state.backend.get_project(&id).await?.is_none() {
        return Err(MockServerError::not_found("Project"));
    }
    Ok(Json(state.backend.project_goals(&id).await?))
}
