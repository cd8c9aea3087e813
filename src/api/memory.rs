//! In-process backend
//!
//! Implements the full REST contract over an [`EntityStore`], including the
//! server-side rules the real service enforces:
//!
//! - payloads are validated with the same schemas the client uses
//! - deletes cascade (project -> goals -> tasks, task -> dependencies,
//!   document -> references and attachment)
//! - task status changes stamp or clear `date_completed`
//!
//! Used by the mock server and as a test double for the application layer.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::backend::{Attachment, Backend};
use super::error::{ClientError, ClientResult};
use crate::model::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, DependencyRequest, EntityKind, Goal,
    KnowledgeBase, KnowledgeReference, Project, ReferenceRequest, Task, TaskDependency,
    TaskStatus, UpdateGoal, UpdateKnowledge, UpdateProject, UpdateTask,
};
use crate::store::EntityStore;
use crate::validation;
use crate::views::knowledge_with_references;

#[derive(Default)]
struct MemoryState {
    store: EntityStore,
    attachments: HashMap<String, Attachment>,
}

impl MemoryState {
    /// Document with its reference lists filled in
    fn rendered(&self, id: &str) -> Option<KnowledgeBase> {
        self.store
            .knowledge_item(id)
            .map(|kb| knowledge_with_references(&self.store, kb).document)
    }
}

/// Backend holding all data in memory
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    requests: AtomicUsize,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Strip any directory components from an uploaded filename
fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if base.is_empty() || base.chars().all(|c| c == '.') {
        None
    } else {
        Some(base.to_string())
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    fn record(&self, operation: &'static str) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(operation, "Memory backend request");
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    // ============================================
    // Projects
    // ============================================

    async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        self.record("list_projects");
        Ok(self.state.read().await.store.projects().to_vec())
    }

    async fn get_project(&self, id: &str) -> ClientResult<Option<Project>> {
        self.record("get_project");
        Ok(self.state.read().await.store.project(id).cloned())
    }

    async fn create_project(&self, payload: &CreateProject) -> ClientResult<Project> {
        self.record("create_project");
        validation::validate_create_project(payload)?;

        let project = Project::from_create(new_id(), payload.clone(), Utc::now());
        self.state.write().await.store.upsert_project(project.clone());
        tracing::debug!(id = %project.id, "Project created");
        Ok(project)
    }

    async fn update_project(&self, id: &str, payload: &UpdateProject) -> ClientResult<Option<Project>> {
        self.record("update_project");
        let mut state = self.state.write().await;
        let Some(mut project) = state.store.project(id).cloned() else {
            return Ok(None);
        };
        validation::validate_update_project(payload, &state.store, id)?;

        project.apply(payload, Utc::now());
        state.store.upsert_project(project.clone());
        Ok(Some(project))
    }

    async fn delete_project(&self, id: &str) -> ClientResult<bool> {
        self.record("delete_project");
        let report = self.state.write().await.store.remove_project(id);
        if let Some(report) = &report {
            tracing::debug!(id, removed = report.total(), "Project deleted");
        }
        Ok(report.is_some())
    }

    async fn project_goals(&self, project_id: &str) -> ClientResult<Vec<Goal>> {
        self.record("project_goals");
        let state = self.state.read().await;
        Ok(state.store.goals_for_project(project_id).cloned().collect())
    }

    // ============================================
    // Goals
    // ============================================

    async fn list_goals(&self) -> ClientResult<Vec<Goal>> {
        self.record("list_goals");
        Ok(self.state.read().await.store.goals().to_vec())
    }

    async fn get_goal(&self, id: &str) -> ClientResult<Option<Goal>> {
        self.record("get_goal");
        Ok(self.state.read().await.store.goal(id).cloned())
    }

    async fn create_goal(&self, payload: &CreateGoal) -> ClientResult<Goal> {
        self.record("create_goal");
        let mut state = self.state.write().await;
        validation::validate_create_goal(payload, &state.store)?;

        let goal = Goal::from_create(new_id(), payload.clone(), Utc::now());
        state.store.upsert_goal(goal.clone());
        Ok(goal)
    }

    async fn update_goal(&self, id: &str, payload: &UpdateGoal) -> ClientResult<Option<Goal>> {
        self.record("update_goal");
        let mut state = self.state.write().await;
        let Some(mut goal) = state.store.goal(id).cloned() else {
            return Ok(None);
        };
        validation::validate_update_goal(id, payload, &state.store)?;

        goal.apply(payload, Utc::now());
        state.store.upsert_goal(goal.clone());
        Ok(Some(goal))
    }

    async fn delete_goal(&self, id: &str) -> ClientResult<bool> {
        self.record("delete_goal");
        Ok(self.state.write().await.store.remove_goal(id).is_some())
    }

    async fn goal_tasks(&self, goal_id: &str) -> ClientResult<Vec<Task>> {
        self.record("goal_tasks");
        let state = self.state.read().await;
        Ok(state.store.tasks_for_goal(goal_id).cloned().collect())
    }

    // ============================================
    // Tasks
    // ============================================

    async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        self.record("list_tasks");
        Ok(self.state.read().await.store.tasks().to_vec())
    }

    async fn get_task(&self, id: &str) -> ClientResult<Option<Task>> {
        self.record("get_task");
        Ok(self.state.read().await.store.task(id).cloned())
    }

    async fn create_task(&self, payload: &CreateTask) -> ClientResult<Task> {
        self.record("create_task");
        let mut state = self.state.write().await;
        validation::validate_create_task(payload, &state.store)?;

        let now = Utc::now();
        let mut task = Task::from_create(new_id(), payload.clone(), now);
        if task.status.is_done() && task.date_completed.is_none() {
            task.date_completed = Some(now.date_naive());
        }
        state.store.upsert_task(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &str, payload: &UpdateTask) -> ClientResult<Option<Task>> {
        self.record("update_task");
        let mut state = self.state.write().await;
        let Some(mut task) = state.store.task(id).cloned() else {
            return Ok(None);
        };
        validation::validate_update_task(payload, &state.store)?;

        let now = Utc::now();
        task.apply(payload, now.date_naive(), now);
        state.store.upsert_task(task.clone());
        Ok(Some(task))
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> ClientResult<Option<Task>> {
        self.record("update_task_status");
        let mut state = self.state.write().await;
        let Some(mut task) = state.store.task(id).cloned() else {
            return Ok(None);
        };

        let now = Utc::now();
        task.set_status(status, now.date_naive(), now);
        state.store.upsert_task(task.clone());
        Ok(Some(task))
    }

    async fn delete_task(&self, id: &str) -> ClientResult<bool> {
        self.record("delete_task");
        Ok(self.state.write().await.store.remove_task(id).is_some())
    }

    // ============================================
    // Knowledge base
    // ============================================

    async fn list_knowledge(&self) -> ClientResult<Vec<KnowledgeBase>> {
        self.record("list_knowledge");
        let state = self.state.read().await;
        Ok(state
            .store
            .knowledge()
            .iter()
            .filter_map(|kb| state.rendered(&kb.id))
            .collect())
    }

    async fn get_knowledge(&self, id: &str) -> ClientResult<Option<KnowledgeBase>> {
        self.record("get_knowledge");
        Ok(self.state.read().await.rendered(id))
    }

    async fn create_knowledge(&self, payload: &CreateKnowledge) -> ClientResult<KnowledgeBase> {
        self.record("create_knowledge");
        let mut state = self.state.write().await;
        validation::validate_create_knowledge(payload, &state.store)?;

        let doc = KnowledgeBase::from_create(new_id(), payload.clone(), Utc::now());
        let id = doc.id.clone();
        state.store.upsert_knowledge(doc);
        for (kind, entity_id) in payload.relations() {
            state.store.add_reference(KnowledgeReference {
                knowledge_base_id: id.clone(),
                entity_type: kind,
                entity_id: entity_id.to_string(),
            });
        }

        state
            .rendered(&id)
            .ok_or_else(|| ClientError::bad_request("Knowledge base item vanished during create"))
    }

    async fn update_knowledge(
        &self,
        id: &str,
        payload: &UpdateKnowledge,
    ) -> ClientResult<Option<KnowledgeBase>> {
        self.record("update_knowledge");
        let mut state = self.state.write().await;
        let Some(mut doc) = state.rendered(id) else {
            return Ok(None);
        };
        validation::validate_update_knowledge(payload)?;

        doc.apply(payload, Utc::now());
        state.store.upsert_knowledge(doc);
        Ok(state.rendered(id))
    }

    async fn delete_knowledge(&self, id: &str) -> ClientResult<bool> {
        self.record("delete_knowledge");
        let mut state = self.state.write().await;
        let removed = state.store.remove_knowledge(id).is_some();
        if removed {
            state.attachments.remove(id);
        }
        Ok(removed)
    }

    async fn knowledge_for_entity(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<Vec<KnowledgeBase>> {
        self.record("knowledge_for_entity");
        let state = self.state.read().await;
        Ok(state
            .store
            .knowledge_for(kind, entity_id)
            .filter_map(|kb| state.rendered(&kb.id))
            .collect())
    }

    async fn add_reference(
        &self,
        knowledge_base_id: &str,
        reference: &ReferenceRequest,
    ) -> ClientResult<Option<KnowledgeBase>> {
        self.record("add_reference");
        let mut state = self.state.write().await;
        if state.store.knowledge_item(knowledge_base_id).is_none() {
            return Ok(None);
        }
        validation::validate_reference(
            knowledge_base_id,
            reference.entity_type,
            &reference.entity_id,
            &state.store,
        )?;

        state.store.add_reference(KnowledgeReference {
            knowledge_base_id: knowledge_base_id.to_string(),
            entity_type: reference.entity_type,
            entity_id: reference.entity_id.clone(),
        });
        Ok(state.rendered(knowledge_base_id))
    }

    async fn remove_reference(
        &self,
        knowledge_base_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<Option<KnowledgeBase>> {
        self.record("remove_reference");
        let mut state = self.state.write().await;
        if state.store.knowledge_item(knowledge_base_id).is_none() {
            return Ok(None);
        }

        state.store.remove_reference(&KnowledgeReference {
            knowledge_base_id: knowledge_base_id.to_string(),
            entity_type: kind,
            entity_id: entity_id.to_string(),
        });
        Ok(state.rendered(knowledge_base_id))
    }

    async fn upload_attachment(
        &self,
        knowledge_base_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Option<String>> {
        self.record("upload_attachment");
        let mut state = self.state.write().await;
        let Some(mut doc) = state.rendered(knowledge_base_id) else {
            return Ok(None);
        };
        let filename = sanitize_filename(filename)
            .ok_or_else(|| ClientError::bad_request("Invalid attachment filename"))?;

        doc.file_attachment = Some(filename.clone());
        doc.updated_at = Utc::now();
        state.store.upsert_knowledge(doc);
        state.attachments.insert(
            knowledge_base_id.to_string(),
            Attachment {
                filename: filename.clone(),
                content_type: None,
                bytes,
            },
        );
        Ok(Some(filename))
    }

    async fn download_attachment(&self, knowledge_base_id: &str) -> ClientResult<Option<Attachment>> {
        self.record("download_attachment");
        Ok(self.state.read().await.attachments.get(knowledge_base_id).cloned())
    }

    async fn delete_attachment(&self, knowledge_base_id: &str) -> ClientResult<bool> {
        self.record("delete_attachment");
        let mut state = self.state.write().await;
        if state.attachments.remove(knowledge_base_id).is_none() {
            return Ok(false);
        }
        if let Some(mut doc) = state.rendered(knowledge_base_id) {
            doc.file_attachment = None;
            doc.updated_at = Utc::now();
            state.store.upsert_knowledge(doc);
        }
        Ok(true)
    }

    // ============================================
    // Task dependencies
    // ============================================

    async fn list_dependencies(&self) -> ClientResult<Vec<TaskDependency>> {
        self.record("list_dependencies");
        Ok(self.state.read().await.store.dependencies().to_vec())
    }

    async fn add_dependency(&self, request: &DependencyRequest) -> ClientResult<TaskDependency> {
        self.record("add_dependency");
        let mut state = self.state.write().await;

        let existing = state.store.dependencies().iter().find(|d| {
            d.task_id == request.task_id && d.depends_on_task_id == request.depends_on_task_id
        });
        if let Some(existing) = existing {
            return Ok(existing.clone());
        }
        validation::validate_dependency(&request.task_id, &request.depends_on_task_id, &state.store)?;

        let dependency = TaskDependency {
            id: new_id(),
            task_id: request.task_id.clone(),
            depends_on_task_id: request.depends_on_task_id.clone(),
            created_at: Utc::now(),
        };
        state.store.add_dependency(dependency.clone());
        Ok(dependency)
    }

    async fn remove_dependency(&self, task_id: &str, depends_on_task_id: &str) -> ClientResult<bool> {
        self.record("remove_dependency");
        Ok(self
            .state
            .write()
            .await
            .store
            .remove_dependency(task_id, depends_on_task_id))
    }
}
