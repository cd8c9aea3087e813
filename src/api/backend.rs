//! Backend abstraction
//!
//! Every data operation the application performs goes through [`Backend`].
//! [`HttpBackend`](super::HttpBackend) talks to the REST service;
//! [`MemoryBackend`](super::MemoryBackend) keeps everything in process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ClientResult;
use crate::model::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, DependencyRequest, EntityKind, Goal,
    KnowledgeBase, Project, ReferenceRequest, Task, TaskDependency, TaskStatus, UpdateGoal,
    UpdateKnowledge, UpdateProject, UpdateTask,
};

/// A file attached to a knowledge base document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Body returned by delete endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteResponse {
    pub message: String,
}

/// Body returned by the upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub filename: String,
}

/// Data operations against the Event Horizon service
#[async_trait]
pub trait Backend: Send + Sync {
    // Projects
    async fn list_projects(&self) -> ClientResult<Vec<Project>>;
    async fn get_project(&self, id: &str) -> ClientResult<Option<Project>>;
    async fn create_project(&self, payload: &CreateProject) -> ClientResult<Project>;
    async fn update_project(&self, id: &str, payload: &UpdateProject) -> ClientResult<Option<Project>>;
    async fn delete_project(&self, id: &str) -> ClientResult<bool>;
    async fn project_goals(&self, project_id: &str) -> ClientResult<Vec<Goal>>;

    // Goals
    async fn list_goals(&self) -> ClientResult<Vec<Goal>>;
    async fn get_goal(&self, id: &str) -> ClientResult<Option<Goal>>;
    async fn create_goal(&self, payload: &CreateGoal) -> ClientResult<Goal>;
    async fn update_goal(&self, id: &str, payload: &UpdateGoal) -> ClientResult<Option<Goal>>;
    async fn delete_goal(&self, id: &str) -> ClientResult<bool>;
    async fn goal_tasks(&self, goal_id: &str) -> ClientResult<Vec<Task>>;

    // Tasks
    async fn list_tasks(&self) -> ClientResult<Vec<Task>>;
    async fn get_task(&self, id: &str) -> ClientResult<Option<Task>>;
    async fn create_task(&self, payload: &CreateTask) -> ClientResult<Task>;
    async fn update_task(&self, id: &str, payload: &UpdateTask) -> ClientResult<Option<Task>>;
    async fn update_task_status(&self, id: &str, status: TaskStatus) -> ClientResult<Option<Task>>;
    async fn delete_task(&self, id: &str) -> ClientResult<bool>;

    // Knowledge base
    async fn list_knowledge(&self) -> ClientResult<Vec<KnowledgeBase>>;
    async fn get_knowledge(&self, id: &str) -> ClientResult<Option<KnowledgeBase>>;
    async fn create_knowledge(&self, payload: &CreateKnowledge) -> ClientResult<KnowledgeBase>;
    async fn update_knowledge(
        &self,
        id: &str,
        payload: &UpdateKnowledge,
    ) -> ClientResult<Option<KnowledgeBase>>;
    async fn delete_knowledge(&self, id: &str) -> ClientResult<bool>;

    /// Documents referencing a project, goal or task
    async fn knowledge_for_entity(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<Vec<KnowledgeBase>>;

    /// Returns the updated document, or `None` if it does not exist
    async fn add_reference(
        &self,
        knowledge_base_id: &str,
        reference: &ReferenceRequest,
    ) -> ClientResult<Option<KnowledgeBase>>;

    async fn remove_reference(
        &self,
        knowledge_base_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<Option<KnowledgeBase>>;

    /// Store a file on a document; returns the stored filename
    async fn upload_attachment(
        &self,
        knowledge_base_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Option<String>>;

    async fn download_attachment(&self, knowledge_base_id: &str) -> ClientResult<Option<Attachment>>;

    async fn delete_attachment(&self, knowledge_base_id: &str) -> ClientResult<bool>;

    // Task dependencies
    async fn list_dependencies(&self) -> ClientResult<Vec<TaskDependency>>;
    async fn add_dependency(&self, request: &DependencyRequest) -> ClientResult<TaskDependency>;
    async fn remove_dependency(&self, task_id: &str, depends_on_task_id: &str) -> ClientResult<bool>;
}
