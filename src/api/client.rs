//! Event Horizon REST API Client
//!
//! [`Backend`] implementation over HTTP. A 404 on a single-resource call maps
//! to `Ok(None)` / `Ok(false)`; any other non-success status becomes
//! [`ClientError::Api`] carrying the server's parsed `detail`.

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::backend::{Attachment, Backend, DeleteResponse, UploadResponse};
use super::error::{ClientError, ClientResult};
use crate::model::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, DependencyRequest, EntityKind, Goal,
    KnowledgeBase, Project, ReferenceRequest, StatusPatch, Task, TaskDependency, TaskStatus,
    UpdateGoal, UpdateKnowledge, UpdateProject, UpdateTask,
};
use crate::validation::parse_server_detail;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for the Event Horizon service
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

/// Percent-encode one path segment
fn seg(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Extract the filename from a `Content-Disposition` header value
fn disposition_filename(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}

impl HttpBackend {
    /// Create a client for the API rooted at `base_url` (e.g. `http://localhost:8000/api`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: RequestBuilder) -> ClientResult<Response> {
        let request = request.build().map_err(ClientError::from_transport)?;
        tracing::debug!(method = %request.method(), url = %request.url(), "API request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(ClientError::from_transport)?;

        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "API request failed");
        }
        Ok(response)
    }

    /// Convert a failed response into an API error
    async fn error_from(response: Response) -> ClientError {
        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();

        let detail = serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| parse_server_detail(&value))
            .or_else(|| {
                let text = String::from_utf8_lossy(&body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        ClientError::Api {
            status: status.as_u16(),
            detail,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let body = response.bytes().await.map_err(ClientError::from_transport)?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.execute(request).await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Self::decode(response).await
    }

    async fn json_optional<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<Option<T>> {
        let response = self.execute(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Self::decode(response).await.map(Some)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Vec<T>> {
        self.json(self.client.get(self.url(path))).await
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Option<T>> {
        self.json_optional(self.client.get(self.url(path))).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.json(self.client.post(self.url(path)).json(body)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<Option<T>> {
        self.json_optional(self.client.put(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<bool> {
        let response = self.execute(self.client.delete(self.url(path))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        // Body is informational only
        if let Ok(body) = Self::decode::<DeleteResponse>(response).await {
            tracing::debug!(message = %body.message, "Deleted");
        }
        Ok(true)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    // ============================================
    // Projects
    // ============================================

    async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        self.get_list("/projects/").await
    }

    async fn get_project(&self, id: &str) -> ClientResult<Option<Project>> {
        self.get_one(&format!("/projects/{}", seg(id))).await
    }

    async fn create_project(&self, payload: &CreateProject) -> ClientResult<Project> {
        self.post("/projects/", payload).await
    }

    async fn update_project(&self, id: &str, payload: &UpdateProject) -> ClientResult<Option<Project>> {
        self.put(&format!("/projects/{}", seg(id)), payload).await
    }

    async fn delete_project(&self, id: &str) -> ClientResult<bool> {
        self.delete(&format!("/projects/{}", seg(id))).await
    }

    async fn project_goals(&self, project_id: &str) -> ClientResult<Vec<Goal>> {
        self.get_list(&format!("/projects/{}/goals", seg(project_id))).await
    }

    // ============================================
    // Goals
    // ============================================

    async fn list_goals(&self) -> ClientResult<Vec<Goal>> {
        self.get_list("/goals/").await
    }

    async fn get_goal(&self, id: &str) -> ClientResult<Option<Goal>> {
        self.get_one(&format!("/goals/{}", seg(id))).await
    }

    async fn create_goal(&self, payload: &CreateGoal) -> ClientResult<Goal> {
        self.post("/goals/", payload).await
    }

    async fn update_goal(&self, id: &str, payload: &UpdateGoal) -> ClientResult<Option<Goal>> {
        self.put(&format!("/goals/{}", seg(id)), payload).await
    }

    async fn delete_goal(&self, id: &str) -> ClientResult<bool> {
        self.delete(&format!("/goals/{}", seg(id))).await
    }

    async fn goal_tasks(&self, goal_id: &str) -> ClientResult<Vec<Task>> {
        self.get_list(&format!("/goals/{}/tasks", seg(goal_id))).await
    }

    // ============================================
    // Tasks
    // ============================================

    async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        self.get_list("/tasks/").await
    }

    async fn get_task(&self, id: &str) -> ClientResult<Option<Task>> {
        self.get_one(&format!("/tasks/{}", seg(id))).await
    }

    async fn create_task(&self, payload: &CreateTask) -> ClientResult<Task> {
        self.post("/tasks/", payload).await
    }

    async fn update_task(&self, id: &str, payload: &UpdateTask) -> ClientResult<Option<Task>> {
        self.put(&format!("/tasks/{}", seg(id)), payload).await
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> ClientResult<Option<Task>> {
        let request = self
            .client
            .patch(self.url(&format!("/tasks/{}/status", seg(id))))
            .json(&StatusPatch { status });
        self.json_optional(request).await
    }

    async fn delete_task(&self, id: &str) -> ClientResult<bool> {
        self.delete(&format!("/tasks/{}", seg(id))).await
    }

    // ============================================
    // Knowledge base
    // ============================================

    async fn list_knowledge(&self) -> ClientResult<Vec<KnowledgeBase>> {
        self.get_list("/knowledge/").await
    }

    async fn get_knowledge(&self, id: &str) -> ClientResult<Option<KnowledgeBase>> {
        self.get_one(&format!("/knowledge/{}", seg(id))).await
    }

    async fn create_knowledge(&self, payload: &CreateKnowledge) -> ClientResult<KnowledgeBase> {
        self.post("/knowledge/", payload).await
    }

    async fn update_knowledge(
        &self,
        id: &str,
        payload: &UpdateKnowledge,
    ) -> ClientResult<Option<KnowledgeBase>> {
        self.put(&format!("/knowledge/{}", seg(id)), payload).await
    }

    async fn delete_knowledge(&self, id: &str) -> ClientResult<bool> {
        self.delete(&format!("/knowledge/{}", seg(id))).await
    }

    async fn knowledge_for_entity(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<Vec<KnowledgeBase>> {
        self.get_list(&format!("/knowledge/{}/{}", kind.as_str(), seg(entity_id)))
            .await
    }

    async fn add_reference(
        &self,
        knowledge_base_id: &str,
        reference: &ReferenceRequest,
    ) -> ClientResult<Option<KnowledgeBase>> {
        let request = self
            .client
            .post(self.url(&format!("/knowledge/{}/references", seg(knowledge_base_id))))
            .json(reference);
        self.json_optional(request).await
    }

    async fn remove_reference(
        &self,
        knowledge_base_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<Option<KnowledgeBase>> {
        let path = format!(
            "/knowledge/{}/references/{}/{}",
            seg(knowledge_base_id),
            kind.as_str(),
            seg(entity_id)
        );
        self.json_optional(self.client.delete(self.url(&path))).await
    }

    async fn upload_attachment(
        &self,
        knowledge_base_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Option<String>> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self
            .client
            .post(self.url(&format!("/knowledge/{}/upload", seg(knowledge_base_id))))
            .multipart(form);

        let uploaded: Option<UploadResponse> = self.json_optional(request).await?;
        Ok(uploaded.map(|u| u.filename))
    }

    async fn download_attachment(&self, knowledge_base_id: &str) -> ClientResult<Option<Attachment>> {
        let url = self.url(&format!("/knowledge/{}/download", seg(knowledge_base_id)));
        let response = self.execute(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let headers = response.headers();
        let filename = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename)
            .unwrap_or_else(|| "attachment".to_string());
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(ClientError::from_transport)?;

        Ok(Some(Attachment {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        }))
    }

    async fn delete_attachment(&self, knowledge_base_id: &str) -> ClientResult<bool> {
        self.delete(&format!("/knowledge/{}/attachment", seg(knowledge_base_id)))
            .await
    }

    // ============================================
    // Task dependencies
    // ============================================

    async fn list_dependencies(&self) -> ClientResult<Vec<TaskDependency>> {
        self.get_list("/task-dependencies/").await
    }

    async fn add_dependency(&self, request: &DependencyRequest) -> ClientResult<TaskDependency> {
        self.post("/task-dependencies/", request).await
    }

    async fn remove_dependency(&self, task_id: &str, depends_on_task_id: &str) -> ClientResult<bool> {
        self.delete(&format!(
            "/task-dependencies/{}/{}",
            seg(task_id),
            seg(depends_on_task_id)
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::mock_server::{build_router, MockState};
    use crate::model::{GoalScope, WorkStatus};
    use std::sync::Arc;

    /// Start a mock server on an ephemeral port and return a client for it
    async fn spawn_backend() -> HttpBackend {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(MockState::new(Arc::new(MemoryBackend::new())));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpBackend::new(format!("http://{}/api/", addr), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename("attachment; filename=\"plan.md\"").as_deref(),
            Some("plan.md")
        );
        assert_eq!(disposition_filename("inline").as_deref(), None);
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = HttpBackend::new("http://localhost:8000/api/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/projects/"), "http://localhost:8000/api/projects/");
    }

    #[tokio::test]
    async fn test_crud_round_trip() {
        let api = spawn_backend().await;

        let project = api.create_project(&CreateProject::new("Alpha")).await.unwrap();
        let goal = api
            .create_goal(&CreateGoal::new("G1", &project.id).scope(GoalScope::Monthly))
            .await
            .unwrap();
        let task = api.create_task(&CreateTask::new("T1", &goal.id)).await.unwrap();

        assert_eq!(api.list_projects().await.unwrap().len(), 1);
        assert_eq!(api.project_goals(&project.id).await.unwrap()[0].id, goal.id);
        assert_eq!(api.goal_tasks(&goal.id).await.unwrap()[0].name, "T1");

        let done = api
            .update_task_status(&task.id, WorkStatus::Done)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.status, WorkStatus::Done);
        assert!(done.date_completed.is_some());

        assert!(api.delete_project(&project.id).await.unwrap());
        assert!(api.get_task(&task.id).await.unwrap().is_none());
        assert!(!api.delete_project(&project.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_resource_is_none() {
        let api = spawn_backend().await;
        assert!(api.get_goal("does/not exist").await.unwrap().is_none());
        assert!(api
            .update_project("nope", &UpdateProject::default())
            .await
            .unwrap()
            .is_none());
        assert!(api.download_attachment("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_validation_detail() {
        let api = spawn_backend().await;
        let err = api
            .create_task(&CreateTask::new("T1", "missing-goal"))
            .await
            .unwrap_err();
        match err {
            ClientError::Api { status, detail } => {
                assert_eq!(status, 422);
                assert_eq!(detail, "goal_id: goal 'missing-goal' does not exist");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_attachment_round_trip() {
        let api = spawn_backend().await;
        let doc = api
            .create_knowledge(&CreateKnowledge::new("Notes").content("# Notes"))
            .await
            .unwrap();

        let stored = api
            .upload_attachment(&doc.id, "plan.md", b"step one".to_vec())
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some("plan.md"));

        let file = api.download_attachment(&doc.id).await.unwrap().unwrap();
        assert_eq!(file.filename, "plan.md");
        assert_eq!(file.bytes, b"step one");

        assert!(api.delete_attachment(&doc.id).await.unwrap());
        let doc = api.get_knowledge(&doc.id).await.unwrap().unwrap();
        assert_eq!(doc.file_attachment, None);
    }

    #[tokio::test]
    async fn test_references_and_dependencies() {
        let api = spawn_backend().await;
        let project = api.create_project(&CreateProject::new("Alpha")).await.unwrap();
        let goal = api.create_goal(&CreateGoal::new("G1", &project.id)).await.unwrap();
        let first = api.create_task(&CreateTask::new("T1", &goal.id)).await.unwrap();
        let second = api.create_task(&CreateTask::new("T2", &goal.id)).await.unwrap();
        let doc = api.create_knowledge(&CreateKnowledge::new("Notes")).await.unwrap();

        let linked = api
            .add_reference(
                &doc.id,
                &ReferenceRequest {
                    entity_type: EntityKind::Goal,
                    entity_id: goal.id.clone(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(linked.related_entities, vec!["G1"]);
        assert_eq!(
            api.knowledge_for_entity(EntityKind::Goal, &goal.id).await.unwrap().len(),
            1
        );

        let unlinked = api
            .remove_reference(&doc.id, EntityKind::Goal, &goal.id)
            .await
            .unwrap()
            .unwrap();
        assert!(unlinked.related_entity_ids.is_empty());

        let dependency = api
            .add_dependency(&DependencyRequest {
                task_id: second.id.clone(),
                depends_on_task_id: first.id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(dependency.depends_on_task_id, first.id);
        assert_eq!(api.list_dependencies().await.unwrap().len(), 1);
        assert!(api.remove_dependency(&second.id, &first.id).await.unwrap());
        assert!(!api.remove_dependency(&second.id, &first.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Nothing listens on port 9 of localhost
        let api = HttpBackend::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let err = api.list_projects().await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable | ClientError::Timeout));
    }
}
