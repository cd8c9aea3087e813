//! Knowledge Base Routes
//!
//! - GET|POST /api/knowledge/
//! - GET|PUT|DELETE /api/knowledge/:id
//! - GET /api/knowledge/{project,goal,task}/:entity_id - Documents referencing an entity
//! - POST /api/knowledge/:id/references - Link a document to an entity
//! - DELETE /api/knowledge/:id/references/:kind/:entity_id - Unlink
//! - POST /api/knowledge/:id/upload - Multipart upload, field `file`
//! - GET /api/knowledge/:id/download - Attachment bytes
//! - DELETE /api/knowledge/:id/attachment - Remove the attachment

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::deleted;
use crate::api::{Backend, DeleteResponse, UploadResponse};
use crate::mock_server::error::{MockResult, MockServerError};
use crate::mock_server::state::MockState;
use crate::model::{CreateKnowledge, EntityKind, KnowledgeBase, ReferenceRequest, UpdateKnowledge};

const NOT_FOUND: &str = "Knowledge base item";

pub async fn list_knowledge(
    State(state): State<Arc<MockState>>,
) -> MockResult<Json<Vec<KnowledgeBase>>> {
    Ok(Json(state.backend.list_knowledge().await?))
}

pub async fn get_knowledge(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<KnowledgeBase>> {
    state
        .backend
        .get_knowledge(&id)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found(NOT_FOUND))
}

pub async fn create_knowledge(
    State(state): State<Arc<MockState>>,
    Json(payload): Json<CreateKnowledge>,
) -> MockResult<(StatusCode, Json<KnowledgeBase>)> {
    let doc = state.backend.create_knowledge(&payload).await?;
    tracing::info!(knowledge_id = %doc.id, references = doc.related_entity_ids.len(), "Created knowledge base item");
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn update_knowledge(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateKnowledge>,
) -> MockResult<Json<KnowledgeBase>> {
    state
        .backend
        .update_knowledge(&id, &payload)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found(NOT_FOUND))
}

pub async fn delete_knowledge(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<DeleteResponse>> {
    deleted(state.backend.delete_knowledge(&id).await?, NOT_FOUND)
}

async fn knowledge_for(
    state: &MockState,
    kind: EntityKind,
    entity_id: &str,
) -> MockResult<Json<Vec<KnowledgeBase>>> {
    Ok(Json(state.backend.knowledge_for_entity(kind, entity_id).await?))
}

pub async fn knowledge_for_project(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<Vec<KnowledgeBase>>> {
    knowledge_for(&state, EntityKind::Project, &id).await
}

pub async fn knowledge_for_goal(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<Vec<KnowledgeBase>>> {
    knowledge_for(&state, EntityKind::Goal, &id).await
}

pub async fn knowledge_for_task(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<Vec<KnowledgeBase>>> {
    knowledge_for(&state, EntityKind::Task, &id).await
}

pub async fn add_reference(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(reference): Json<ReferenceRequest>,
) -> MockResult<Json<KnowledgeBase>> {
    state
        .backend
        .add_reference(&id, &reference)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found(NOT_FOUND))
}

pub async fn remove_reference(
    State(state): State<Arc<MockState>>,
    Path((id, kind, entity_id)): Path<(String, String, String)>,
) -> MockResult<Json<KnowledgeBase>> {
    let kind: EntityKind = kind
        .parse()
        .map_err(|e: crate::model::ModelError| MockServerError::BadRequest(e.to_string()))?;
    state
        .backend
        .remove_reference(&id, kind, &entity_id)
        .await?
        .map(Json)
        .ok_or_else(|| MockServerError::not_found(NOT_FOUND))
}

pub async fn upload_attachment(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> MockResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MockServerError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("attachment").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| MockServerError::BadRequest(format!("Invalid upload: {}", e)))?;

        let stored = state
            .backend
            .upload_attachment(&id, &filename, bytes.to_vec())
            .await?
            .ok_or_else(|| MockServerError::not_found(NOT_FOUND))?;
        tracing::info!(knowledge_id = %id, filename = %stored, size = bytes.len(), "Stored attachment");
        return Ok(Json(UploadResponse { filename: stored }));
    }

    Err(MockServerError::BadRequest("Missing 'file' field".to_string()))
}

pub async fn download_attachment(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<impl IntoResponse> {
    let attachment = state
        .backend
        .download_attachment(&id)
        .await?
        .ok_or_else(|| MockServerError::not_found("Attachment"))?;

    let content_type = attachment
        .content_type
        .unwrap_or_else(|| content_type_for(&attachment.filename).to_string());
    let disposition = format!("attachment; filename=\"{}\"", attachment.filename);

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        attachment.bytes,
    ))
}

pub async fn delete_attachment(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> MockResult<Json<DeleteResponse>> {
    deleted(state.backend.delete_attachment(&id).await?, "Attachment")
}

/// MIME type from a filename extension
fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "md" | "markdown" => "text/markdown",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("plan.MD"), "text/markdown");
        assert_eq!(content_type_for("report.pdf"), "application/pdf");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }
}
