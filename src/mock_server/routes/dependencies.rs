//! Task Dependency Routes
//!
//! - GET /api/task-dependencies/ - List all dependencies
//! - POST /api/task-dependencies/ - Add a dependency (idempotent)
//! - DELETE /api/task-dependencies/:task_id/:depends_on_task_id - Remove one

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::deleted;
use crate::api::{Backend, DeleteResponse};
use crate::mock_server::error::MockResult;
use crate::mock_server::state::MockState;
use crate::model::{DependencyRequest, TaskDependency};

pub async fn list_dependencies(
    State(state): State<Arc<MockState>>,
) -> MockResult<Json<Vec<TaskDependency>>> {
    Ok(Json(state.backend.list_dependencies().await?))
}

pub async fn add_dependency(
    State(state): State<Arc<MockState>>,
    Json(request): Json<DependencyRequest>,
) -> MockResult<(StatusCode, Json<TaskDependency>)> {
    let dependency = state.backend.add_dependency(&request).await?;
    tracing::info!(
        task_id = %dependency.task_id,
        depends_on = %dependency.depends_on_task_id,
        "Added task dependency"
    );
    Ok((StatusCode::CREATED, Json(dependency)))
}

pub async fn remove_dependency(
    State(state): State<Arc<MockState>>,
    Path((task_id, depends_on_task_id)): Path<(String, String)>,
) -> MockResult<Json<DeleteResponse>> {
    deleted(
        state
            .backend
            .remove_dependency(&task_id, &depends_on_task_id)
            .await?,
        "Dependency",
    )
}
