//! Application controller
//!
//! [`EventHorizon`] ties the pieces together: every mutation is validated
//! against the cached store, sent to the [`Backend`], mirrored into the store
//! and reported as a [`Notification`].
//!
//! ```text
//! form payload ─> validation ─x─> Notification::error   (no request sent)
//!                     │
//!                     v
//!                  Backend ─x─> Notification::error     (store unchanged)
//!                     │
//!                     v
//!                EntityStore ─> StoreEvent ─> views
//!                     │
//!                     v
//!             Notification::success
//! ```

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::{Attachment, Backend, ClientError, ClientResult};
use crate::config::KnowledgeConfig;
use crate::model::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, DependencyRequest, EntityKind, Goal,
    KnowledgeBase, KnowledgeReference, Project, ReferenceRequest, Task, TaskDependency,
    TaskStatus, UpdateGoal, UpdateKnowledge, UpdateProject, UpdateTask,
};
use crate::store::{CascadeReport, Collection, EntityStore};
use crate::validation;
use crate::views::{
    self, GoalProgress, KnowledgeWithReferences, ProjectDashboard, TaskDetails, TaskFilter, TaskSort,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Outcome of [`EventHorizon::load_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<Collection>,
    pub failed: Vec<(Collection, String)>,
    /// Knowledge base fetch was skipped after repeated failures
    pub knowledge_disabled: bool,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.knowledge_disabled
    }
}

/// One file handed to [`EventHorizon::bulk_upload_knowledge`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Outcome of a bulk knowledge upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkUploadReport {
    pub uploaded: Vec<KnowledgeBase>,
    /// Filename and user-facing reason
    pub failed: Vec<(String, String)>,
}

/// Document title for an uploaded file: the name without its last extension
fn document_title(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::Api {
        status: 404,
        detail: format!("{} not found", what),
    }
}

/// Client-side application state over a [`Backend`]
pub struct EventHorizon<B: Backend> {
    backend: B,
    store: EntityStore,
    notifications: VecDeque<Notification>,
    knowledge: KnowledgeConfig,
    knowledge_failures: u32,
}

impl<B: Backend> EventHorizon<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, KnowledgeConfig::default())
    }

    pub fn with_config(backend: B, knowledge: KnowledgeConfig) -> Self {
        Self {
            backend,
            store: EntityStore::new(),
            notifications: VecDeque::new(),
            knowledge,
            knowledge_failures: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// Take all pending notifications, oldest first
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// A limit of 0 never disables loading
    pub fn knowledge_disabled(&self) -> bool {
        let limit = self.knowledge.max_consecutive_failures;
        limit > 0 && self.knowledge_failures >= limit
    }

    /// Allow the knowledge base to load again after it was disabled
    pub fn reset_knowledge(&mut self) {
        self.knowledge_failures = 0;
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
    }

    /// Queue the notification for an operation's outcome and pass it through
    fn finish<T>(
        &mut self,
        action: &str,
        result: ClientResult<T>,
        success: impl FnOnce(&T) -> String,
    ) -> ClientResult<T> {
        match &result {
            Ok(value) => {
                let message = success(value);
                tracing::info!(action, "{}", message);
                self.notify(Notification::success(message));
            }
            Err(ClientError::Validation(errors)) => {
                tracing::debug!(action, errors = %errors, "Rejected by validation");
                self.notify(Notification::error(errors.to_string()));
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "Operation failed");
                self.notify(Notification::error(format!("Failed to {}: {}", action, e.user_message())));
            }
        }
        result
    }

    // ============================================
    // Loading
    // ============================================

    /// Fetch every collection; one failing resource does not block the others
    pub async fn load_all(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        match self.backend.list_projects().await {
            Ok(items) => {
                self.store.replace_projects(items);
                report.loaded.push(Collection::Projects);
            }
            Err(e) => self.load_failed(&mut report, Collection::Projects, e),
        }
        match self.backend.list_goals().await {
            Ok(items) => {
                self.store.replace_goals(items);
                report.loaded.push(Collection::Goals);
            }
            Err(e) => self.load_failed(&mut report, Collection::Goals, e),
        }
        match self.backend.list_tasks().await {
            Ok(items) => {
                self.store.replace_tasks(items);
                report.loaded.push(Collection::Tasks);
            }
            Err(e) => self.load_failed(&mut report, Collection::Tasks, e),
        }
        match self.backend.list_dependencies().await {
            Ok(items) => {
                self.store.replace_dependencies(items);
                report.loaded.push(Collection::Dependencies);
            }
            Err(e) => self.load_failed(&mut report, Collection::Dependencies, e),
        }

        if self.knowledge_disabled() {
            tracing::debug!(
                failures = self.knowledge_failures,
                "Knowledge base loading disabled"
            );
            report.knowledge_disabled = true;
            return report;
        }
        match self.backend.list_knowledge().await {
            Ok(items) => {
                self.knowledge_failures = 0;
                self.store.replace_knowledge(items);
                report.loaded.push(Collection::Knowledge);
            }
            Err(e) => {
                self.knowledge_failures += 1;
                self.load_failed(&mut report, Collection::Knowledge, e);
                if self.knowledge_disabled() {
                    tracing::warn!(
                        failures = self.knowledge_failures,
                        "Knowledge base failed repeatedly, no longer loading it"
                    );
                }
            }
        }

        report
    }

    fn load_failed(&mut self, report: &mut LoadReport, collection: Collection, err: ClientError) {
        tracing::error!(resource = %collection, error = %err, "Failed to load");
        self.notify(Notification::error(format!(
            "Failed to load {}: {}",
            collection,
            err.user_message()
        )));
        report.failed.push((collection, err.user_message()));
    }

    // ============================================
    // Projects
    // ============================================

    pub async fn create_project(&mut self, payload: CreateProject) -> ClientResult<Project> {
        let result = self.try_create_project(&payload).await;
        self.finish("create project", result, |p| format!("Project \"{}\" created", p.name))
    }

    async fn try_create_project(&mut self, payload: &CreateProject) -> ClientResult<Project> {
        validation::validate_create_project(payload)?;
        let project = self.backend.create_project(payload).await?;
        self.store.upsert_project(project.clone());
        Ok(project)
    }

    pub async fn update_project(&mut self, id: &str, payload: UpdateProject) -> ClientResult<Project> {
        let result = self.try_update_project(id, &payload).await;
        self.finish("update project", result, |p| format!("Project \"{}\" updated", p.name))
    }

    async fn try_update_project(&mut self, id: &str, payload: &UpdateProject) -> ClientResult<Project> {
        validation::validate_update_project(payload, &self.store, id)?;
        let project = self
            .backend
            .update_project(id, payload)
            .await?
            .ok_or_else(|| not_found("Project"))?;
        self.store.upsert_project(project.clone());
        Ok(project)
    }

    /// Delete a project; its goals and their tasks go with it
    pub async fn delete_project(&mut self, id: &str) -> ClientResult<CascadeReport> {
        let result = match self.backend.delete_project(id).await {
            Ok(true) => Ok(self.store.remove_project(id).unwrap_or_default()),
            Ok(false) => Err(not_found("Project")),
            Err(e) => Err(e),
        };
        self.finish("delete project", result, |r| {
            format!(
                "Project deleted with {} goals and {} tasks",
                r.goals.len(),
                r.tasks.len()
            )
        })
    }

    // ============================================
    // Goals
    // ============================================

    pub async fn create_goal(&mut self, payload: CreateGoal) -> ClientResult<Goal> {
        let result = self.try_create_goal(&payload).await;
        self.finish("create goal", result, |g| format!("Goal \"{}\" created", g.name))
    }

    async fn try_create_goal(&mut self, payload: &CreateGoal) -> ClientResult<Goal> {
        validation::validate_create_goal(payload, &self.store)?;
        let goal = self.backend.create_goal(payload).await?;
        self.store.upsert_goal(goal.clone());
        Ok(goal)
    }

    pub async fn update_goal(&mut self, id: &str, payload: UpdateGoal) -> ClientResult<Goal> {
        let result = self.try_update_goal(id, &payload).await;
        self.finish("update goal", result, |g| format!("Goal \"{}\" updated", g.name))
    }

    async fn try_update_goal(&mut self, id: &str, payload: &UpdateGoal) -> ClientResult<Goal> {
        validation::validate_update_goal(id, payload, &self.store)?;
        let goal = self
            .backend
            .update_goal(id, payload)
            .await?
            .ok_or_else(|| not_found("Goal"))?;
        self.store.upsert_goal(goal.clone());
        Ok(goal)
    }

    /// Delete a goal with its sub-goals and their tasks
    pub async fn delete_goal(&mut self, id: &str) -> ClientResult<CascadeReport> {
        let result = match self.backend.delete_goal(id).await {
            Ok(true) => Ok(self.store.remove_goal(id).unwrap_or_default()),
            Ok(false) => Err(not_found("Goal")),
            Err(e) => Err(e),
        };
        self.finish("delete goal", result, |r| {
            format!("Goal deleted with {} tasks", r.tasks.len())
        })
    }

    // ============================================
    // Tasks
    // ============================================

    pub async fn create_task(&mut self, payload: CreateTask) -> ClientResult<Task> {
        let result = self.try_create_task(&payload).await;
        self.finish("create task", result, |t| format!("Task \"{}\" created", t.name))
    }

    async fn try_create_task(&mut self, payload: &CreateTask) -> ClientResult<Task> {
        validation::validate_create_task(payload, &self.store)?;
        let task = self.backend.create_task(payload).await?;
        self.store.upsert_task(task.clone());
        Ok(task)
    }

    pub async fn update_task(&mut self, id: &str, payload: UpdateTask) -> ClientResult<Task> {
        let result = self.try_update_task(id, &payload).await;
        self.finish("update task", result, |t| format!("Task \"{}\" updated", t.name))
    }

    async fn try_update_task(&mut self, id: &str, payload: &UpdateTask) -> ClientResult<Task> {
        validation::validate_update_task(payload, &self.store)?;
        let task = self
            .backend
            .update_task(id, payload)
            .await?
            .ok_or_else(|| not_found("Task"))?;
        self.store.upsert_task(task.clone());
        Ok(task)
    }

    pub async fn set_task_status(&mut self, id: &str, status: TaskStatus) -> ClientResult<Task> {
        let result = match self.backend.update_task_status(id, status).await {
            Ok(Some(task)) => {
                self.store.upsert_task(task.clone());
                Ok(task)
            }
            Ok(None) => Err(not_found("Task")),
            Err(e) => Err(e),
        };
        self.finish("update task status", result, |t| {
            format!("Task \"{}\" is now {}", t.name, t.status)
        })
    }

    pub async fn delete_task(&mut self, id: &str) -> ClientResult<CascadeReport> {
        let result = match self.backend.delete_task(id).await {
            Ok(true) => Ok(self.store.remove_task(id).unwrap_or_default()),
            Ok(false) => Err(not_found("Task")),
            Err(e) => Err(e),
        };
        self.finish("delete task", result, |_| "Task deleted".to_string())
    }

    // ============================================
    // Knowledge base
    // ============================================

    pub async fn create_knowledge(&mut self, payload: CreateKnowledge) -> ClientResult<KnowledgeBase> {
        let result = self.try_create_knowledge(&payload).await;
        self.finish("create document", result, |kb| {
            format!("Document \"{}\" created", kb.document_name)
        })
    }

    async fn try_create_knowledge(&mut self, payload: &CreateKnowledge) -> ClientResult<KnowledgeBase> {
        validation::validate_create_knowledge(payload, &self.store)?;
        let doc = self.backend.create_knowledge(payload).await?;
        self.store.upsert_knowledge(doc.clone());
        Ok(doc)
    }

    pub async fn update_knowledge(
        &mut self,
        id: &str,
        payload: UpdateKnowledge,
    ) -> ClientResult<KnowledgeBase> {
        let result = self.try_update_knowledge(id, &payload).await;
        self.finish("update document", result, |kb| {
            format!("Document \"{}\" updated", kb.document_name)
        })
    }

    async fn try_update_knowledge(
        &mut self,
        id: &str,
        payload: &UpdateKnowledge,
    ) -> ClientResult<KnowledgeBase> {
        validation::validate_update_knowledge(payload)?;
        let doc = self
            .backend
            .update_knowledge(id, payload)
            .await?
            .ok_or_else(|| not_found("Knowledge base item"))?;
        self.store.upsert_knowledge(doc.clone());
        Ok(doc)
    }

    pub async fn delete_knowledge(&mut self, id: &str) -> ClientResult<CascadeReport> {
        let result = match self.backend.delete_knowledge(id).await {
            Ok(true) => Ok(self.store.remove_knowledge(id).unwrap_or_default()),
            Ok(false) => Err(not_found("Knowledge base item")),
            Err(e) => Err(e),
        };
        self.finish("delete document", result, |_| "Document deleted".to_string())
    }

    pub async fn add_knowledge_reference(
        &mut self,
        knowledge_base_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<KnowledgeBase> {
        let result = self
            .try_add_reference(knowledge_base_id, kind, entity_id)
            .await;
        self.finish("link document", result, |kb| {
            format!("Linked \"{}\" to {} {}", kb.document_name, kind, entity_id)
        })
    }

    async fn try_add_reference(
        &mut self,
        knowledge_base_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<KnowledgeBase> {
        validation::validate_reference(knowledge_base_id, kind, entity_id, &self.store)?;
        let request = ReferenceRequest {
            entity_type: kind,
            entity_id: entity_id.to_string(),
        };
        let doc = self
            .backend
            .add_reference(knowledge_base_id, &request)
            .await?
            .ok_or_else(|| not_found("Knowledge base item"))?;
        self.store.upsert_knowledge(doc.clone());
        Ok(doc)
    }

    pub async fn remove_knowledge_reference(
        &mut self,
        knowledge_base_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> ClientResult<KnowledgeBase> {
        let result = match self
            .backend
            .remove_reference(knowledge_base_id, kind, entity_id)
            .await
        {
            Ok(Some(doc)) => {
                self.store.upsert_knowledge(doc.clone());
                Ok(doc)
            }
            Ok(None) => Err(not_found("Knowledge base item")),
            Err(e) => Err(e),
        };
        self.finish("unlink document", result, |kb| {
            format!("Unlinked \"{}\" from {} {}", kb.document_name, kind, entity_id)
        })
    }

    /// Attach a file to a document, replacing any previous attachment
    pub async fn upload_attachment(
        &mut self,
        knowledge_base_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<String> {
        let result = match self
            .backend
            .upload_attachment(knowledge_base_id, filename, bytes)
            .await
        {
            Ok(Some(stored)) => {
                self.set_attachment(knowledge_base_id, Some(stored.clone()));
                Ok(stored)
            }
            Ok(None) => Err(not_found("Knowledge base item")),
            Err(e) => Err(e),
        };
        self.finish("upload file", result, |name| format!("Uploaded {}", name))
    }

    pub async fn download_attachment(&mut self, knowledge_base_id: &str) -> ClientResult<Attachment> {
        let result = match self.backend.download_attachment(knowledge_base_id).await {
            Ok(Some(attachment)) => Ok(attachment),
            Ok(None) => Err(not_found("Attachment")),
            Err(e) => Err(e),
        };
        self.finish("download file", result, |a| format!("Downloaded {}", a.filename))
    }

    pub async fn delete_attachment(&mut self, knowledge_base_id: &str) -> ClientResult<()> {
        let result = match self.backend.delete_attachment(knowledge_base_id).await {
            Ok(true) => {
                self.set_attachment(knowledge_base_id, None);
                Ok(())
            }
            Ok(false) => Err(not_found("Attachment")),
            Err(e) => Err(e),
        };
        self.finish("delete file", result, |_| "Attachment removed".to_string())
    }

    /// Create one document per file, each linked to `project_id` and carrying
    /// the file as its attachment.
    ///
    /// Files are processed in order; a failing file is recorded and the rest
    /// still run. `progress` is called after each file with `(done, total, filename)`.
    pub async fn bulk_upload_knowledge(
        &mut self,
        project_id: &str,
        files: Vec<UploadFile>,
        mut progress: impl FnMut(usize, usize, &str),
    ) -> ClientResult<BulkUploadReport> {
        let mut errors = validation::Validator::new();
        errors
            .check(
                self.store.project(project_id).is_some(),
                "project_id",
                format!("project '{}' does not exist", project_id),
            )
            .check(!files.is_empty(), "files", "select at least one file");
        if let Err(errors) = errors.finish() {
            let result = Err(ClientError::Validation(errors));
            return self.finish("upload documents", result, |_: &BulkUploadReport| String::new());
        }

        let total = files.len();
        let mut report = BulkUploadReport::default();

        for (index, file) in files.into_iter().enumerate() {
            let content = String::from_utf8(file.bytes.clone()).ok();
            let payload = CreateKnowledge {
                document_name: document_title(&file.filename),
                ai_summary: content
                    .as_ref()
                    .map(|_| format!("Uploaded from file: {}", file.filename)),
                content,
                related_projects: vec![project_id.to_string()],
                ..Default::default()
            };

            let outcome = match self.create_knowledge(payload).await {
                Ok(doc) => self
                    .upload_attachment(&doc.id, &file.filename, file.bytes)
                    .await
                    .map(|_| doc.id),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(id) => {
                    if let Some(doc) = self.store.knowledge_item(&id) {
                        report.uploaded.push(doc.clone());
                    }
                }
                Err(e) => {
                    tracing::warn!(file = %file.filename, error = %e, "Bulk upload item failed");
                    report.failed.push((file.filename.clone(), e.user_message()));
                }
            }
            progress(index + 1, total, &file.filename);
        }

        if !report.failed.is_empty() {
            self.notify(Notification::error(format!(
                "Failed to upload {} of {} files",
                report.failed.len(),
                total
            )));
        }
        let uploaded = report.uploaded.len();
        self.finish("upload documents", Ok(report), |_| {
            format!(
                "Uploaded {} document{}",
                uploaded,
                if uploaded == 1 { "" } else { "s" }
            )
        })
    }

    fn set_attachment(&mut self, knowledge_base_id: &str, filename: Option<String>) {
        if let Some(doc) = self.store.knowledge_item(knowledge_base_id) {
            let mut doc = doc.clone();
            doc.file_attachment = filename;
            self.store.upsert_knowledge(doc);
        }
    }

    // ============================================
    // Task dependencies
    // ============================================

    pub async fn add_task_dependency(
        &mut self,
        task_id: &str,
        depends_on_task_id: &str,
    ) -> ClientResult<TaskDependency> {
        let result = self.try_add_dependency(task_id, depends_on_task_id).await;
        self.finish("add dependency", result, |_| "Dependency added".to_string())
    }

    async fn try_add_dependency(
        &mut self,
        task_id: &str,
        depends_on_task_id: &str,
    ) -> ClientResult<TaskDependency> {
        validation::validate_dependency(task_id, depends_on_task_id, &self.store)?;
        let request = DependencyRequest {
            task_id: task_id.to_string(),
            depends_on_task_id: depends_on_task_id.to_string(),
        };
        let dependency = self.backend.add_dependency(&request).await?;
        self.store.add_dependency(dependency.clone());
        Ok(dependency)
    }

    pub async fn remove_task_dependency(
        &mut self,
        task_id: &str,
        depends_on_task_id: &str,
    ) -> ClientResult<()> {
        let result = match self
            .backend
            .remove_dependency(task_id, depends_on_task_id)
            .await
        {
            Ok(true) => {
                self.store.remove_dependency(task_id, depends_on_task_id);
                Ok(())
            }
            Ok(false) => Err(not_found("Dependency")),
            Err(e) => Err(e),
        };
        self.finish("remove dependency", result, |_| "Dependency removed".to_string())
    }

    // ============================================
    // Views
    // ============================================

    pub fn dashboards(&self, now: DateTime<Utc>) -> Vec<ProjectDashboard> {
        views::project_dashboards(&self.store, now)
    }

    pub fn dashboard(&self, project_id: &str, now: DateTime<Utc>) -> Option<ProjectDashboard> {
        self.store
            .project(project_id)
            .map(|p| views::project_dashboard(&self.store, p, now))
    }

    pub fn goal_progress(&self, now: DateTime<Utc>) -> Vec<GoalProgress> {
        views::goal_progress_all(&self.store, now)
    }

    pub fn task_details(&self, now: DateTime<Utc>) -> Vec<TaskDetails> {
        views::task_details_all(&self.store, now)
    }

    pub fn task_board(&self, filter: TaskFilter, sort: TaskSort, now: DateTime<Utc>) -> Vec<TaskDetails> {
        views::task_board(&self.store, filter, sort, now)
    }

    pub fn knowledge_with_references(&self) -> Vec<KnowledgeWithReferences> {
        views::knowledge_with_references_all(&self.store)
    }

    /// References stored for a document
    pub fn references_for(&self, knowledge_base_id: &str) -> Vec<KnowledgeReference> {
        self.store.references_for(knowledge_base_id).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::model::{GoalScope, WorkStatus};
    use async_trait::async_trait;

    fn app() -> EventHorizon<MemoryBackend> {
        EventHorizon::new(MemoryBackend::new())
    }

    #[tokio::test]
    async fn test_alpha_scenario() {
        let mut app = app();
        let now = Utc::now();

        let alpha = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        let dash = app.dashboard(&alpha.id, now).unwrap();
        assert_eq!(dash.total_goals, 0);
        assert_eq!(dash.goal_progress_percentage, 0);

        let g1 = app
            .create_goal(CreateGoal::new("G1", &alpha.id).scope(GoalScope::Monthly))
            .await
            .unwrap();
        let dash = app.dashboard(&alpha.id, now).unwrap();
        assert_eq!(dash.total_goals, 1);
        assert_eq!(dash.completed_goals, 0);

        let t1 = app
            .create_task(CreateTask::new("T1", &g1.id).estimate(60))
            .await
            .unwrap();
        let dash = app.dashboard(&alpha.id, now).unwrap();
        assert_eq!(dash.total_tasks, 1);
        assert_eq!(dash.total_estimated_minutes, 60);

        app.set_task_status(&t1.id, WorkStatus::Done).await.unwrap();
        let dash = app.dashboard(&alpha.id, now).unwrap();
        assert_eq!(dash.completed_tasks, 1);
        assert_eq!(dash.task_progress_percentage, 100);
        assert_eq!(dash.completed_estimated_minutes, 60);

        let kinds: Vec<NotificationKind> = app.drain_notifications().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::Success; 4]);
    }

    #[tokio::test]
    async fn test_weekly_milestone_rejected_before_request() {
        let mut app = app();
        let project = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        let sent = app.backend().request_count();

        let result = app
            .create_goal(CreateGoal::new("Week 1", &project.id).scope(GoalScope::WeeklyMilestone))
            .await;

        match result {
            Err(ClientError::Validation(errors)) => assert!(errors.has_field("parent_goal_id")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(app.backend().request_count(), sent);
        assert_eq!(app.store().goals().len(), 0);
        let last = app.notifications().last().unwrap();
        assert_eq!(last.kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_completion_date_set_then_cleared() {
        let mut app = app();
        let project = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        let goal = app.create_goal(CreateGoal::new("G1", &project.id)).await.unwrap();
        let task = app.create_task(CreateTask::new("T1", &goal.id)).await.unwrap();
        assert_eq!(task.date_completed, None);

        let done = app
            .update_task(&task.id, UpdateTask::status(WorkStatus::Done))
            .await
            .unwrap();
        assert_eq!(done.date_completed, Some(Utc::now().date_naive()));

        let active = app
            .update_task(&task.id, UpdateTask::status(WorkStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.date_completed, None);
        assert_eq!(app.store().task(&task.id).unwrap().date_completed, None);
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let mut app = app();
        let project = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        let quarter = app
            .create_goal(CreateGoal::new("Q", &project.id).scope(GoalScope::Quarterly))
            .await
            .unwrap();
        let week = app
            .create_goal(
                CreateGoal::new("W", &project.id)
                    .scope(GoalScope::WeeklyMilestone)
                    .parent(&quarter.id),
            )
            .await
            .unwrap();
        let a = app.create_task(CreateTask::new("A", &quarter.id)).await.unwrap();
        let b = app.create_task(CreateTask::new("B", &week.id)).await.unwrap();
        app.add_task_dependency(&b.id, &a.id).await.unwrap();

        let report = app.delete_project(&project.id).await.unwrap();
        assert_eq!(report.goals.len(), 2);
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(report.dependencies, 1);

        assert!(app.store().goals().is_empty());
        assert!(app.store().tasks().is_empty());
        assert!(app.store().dependencies().is_empty());

        app.load_all().await;
        assert!(app.store().projects().is_empty());
        assert!(app.store().tasks().is_empty());
    }

    #[tokio::test]
    async fn test_done_task_round_trip() {
        let mut app = app();
        let project = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        let goal = app.create_goal(CreateGoal::new("G1", &project.id)).await.unwrap();
        let original = app
            .create_task(
                CreateTask::new("Ship it", &goal.id)
                    .status(WorkStatus::Done)
                    .estimate(30)
                    .assignee("kim"),
            )
            .await
            .unwrap();
        assert!(original.date_completed.is_some());

        app.delete_task(&original.id).await.unwrap();
        let recreated = app.create_task(original.to_create()).await.unwrap();

        assert_ne!(recreated.id, original.id);
        assert_eq!(recreated.to_create(), original.to_create());
    }

    #[tokio::test]
    async fn test_dependency_cycle_rejected() {
        let mut app = app();
        let project = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        let goal = app.create_goal(CreateGoal::new("G1", &project.id)).await.unwrap();
        let a = app.create_task(CreateTask::new("A", &goal.id)).await.unwrap();
        let b = app.create_task(CreateTask::new("B", &goal.id)).await.unwrap();

        app.add_task_dependency(&b.id, &a.id).await.unwrap();
        let sent = app.backend().request_count();
        assert!(app.add_task_dependency(&a.id, &b.id).await.is_err());
        assert_eq!(app.backend().request_count(), sent);

        app.remove_task_dependency(&b.id, &a.id).await.unwrap();
        assert!(app.store().dependencies().is_empty());
    }

    #[tokio::test]
    async fn test_knowledge_references_and_attachment() {
        let mut app = app();
        let project = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        let doc = app
            .create_knowledge(CreateKnowledge::new("Notes").content("# Notes"))
            .await
            .unwrap();

        let linked = app
            .add_knowledge_reference(&doc.id, EntityKind::Project, &project.id)
            .await
            .unwrap();
        assert_eq!(linked.related_entities, vec!["Alpha"]);
        assert_eq!(app.references_for(&doc.id).len(), 1);

        let stored = app
            .upload_attachment(&doc.id, "notes.md", b"# Notes".to_vec())
            .await
            .unwrap();
        assert_eq!(stored, "notes.md");
        assert_eq!(
            app.store().knowledge_item(&doc.id).unwrap().file_attachment.as_deref(),
            Some("notes.md")
        );
        let file = app.download_attachment(&doc.id).await.unwrap();
        assert_eq!(file.bytes, b"# Notes");

        app.delete_attachment(&doc.id).await.unwrap();
        assert!(app.download_attachment(&doc.id).await.is_err());

        app.remove_knowledge_reference(&doc.id, EntityKind::Project, &project.id)
            .await
            .unwrap();
        assert!(app.references_for(&doc.id).is_empty());
    }

    #[tokio::test]
    async fn test_bulk_upload_links_project() {
        let mut app = app();
        let project = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        let files = vec![
            UploadFile {
                filename: "design.notes.md".into(),
                bytes: b"# Design".to_vec(),
            },
            UploadFile {
                filename: "diagram.png".into(),
                bytes: vec![0x89, 0x50, 0xff, 0xfe],
            },
        ];

        let mut seen = Vec::new();
        let report = app
            .bulk_upload_knowledge(&project.id, files, |done, total, name| {
                seen.push((done, total, name.to_string()))
            })
            .await
            .unwrap();

        assert!(report.failed.is_empty());
        assert_eq!(seen, vec![(1, 2, "design.notes.md".to_string()), (2, 2, "diagram.png".to_string())]);

        let notes = &report.uploaded[0];
        assert_eq!(notes.document_name, "design.notes");
        assert_eq!(notes.content.as_deref(), Some("# Design"));
        assert_eq!(notes.ai_summary.as_deref(), Some("Uploaded from file: design.notes.md"));
        assert_eq!(notes.file_attachment.as_deref(), Some("design.notes.md"));

        let diagram = &report.uploaded[1];
        assert_eq!(diagram.content, None);
        assert_eq!(diagram.ai_summary, None);

        assert_eq!(app.store().knowledge_for(EntityKind::Project, &project.id).count(), 2);
        let last = app.drain_notifications().pop().unwrap();
        assert_eq!(last.message, "Uploaded 2 documents");
    }

    #[tokio::test]
    async fn test_bulk_upload_requires_project() {
        let mut app = app();
        let files = vec![UploadFile {
            filename: "a.md".into(),
            bytes: b"a".to_vec(),
        }];
        let result = app.bulk_upload_knowledge("missing", files, |_, _, _| {}).await;
        assert!(matches!(result, Err(ClientError::Validation(ref e)) if e.has_field("project_id")));
        assert_eq!(app.backend().request_count(), 0);
    }

    #[test]
    fn test_document_title() {
        assert_eq!(document_title("report.final.pdf"), "report.final");
        assert_eq!(document_title("README"), "README");
        assert_eq!(document_title(".env"), ".env");
    }

    #[tokio::test]
    async fn test_update_missing_project_reports_error() {
        let mut app = app();
        let result = app
            .update_project("missing", UpdateProject::default())
            .await;
        assert!(matches!(result, Err(ClientError::Api { status: 404, .. })));
        let notification = app.drain_notifications().pop().unwrap();
        assert_eq!(notification.message, "Failed to update project: Project not found");
    }

    #[tokio::test]
    async fn test_delete_missing_project_leaves_store() {
        let mut app = app();
        let project = app.create_project(CreateProject::new("Alpha")).await.unwrap();
        app.backend().delete_project(&project.id).await.unwrap();
        let revision = app.store().revision();

        let result = app.delete_project(&project.id).await;
        assert!(matches!(result, Err(ClientError::Api { status: 404, .. })));
        assert!(app.store().project(&project.id).is_some());
        assert_eq!(app.store().revision(), revision);

        let notification = app.drain_notifications().pop().unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
    }

    /// Backend whose knowledge endpoint always fails
    struct FlakyKnowledge(MemoryBackend);

    #[async_trait]
    impl Backend for FlakyKnowledge {
        async fn list_projects(&self) -> ClientResult<Vec<Project>> {
            self.0.list_projects().await
        }
        async fn get_project(&self, id: &str) -> ClientResult<Option<Project>> {
            self.0.get_project(id).await
        }
        async fn create_project(&self, payload: &CreateProject) -> ClientResult<Project> {
            self.0.create_project(payload).await
        }
        async fn update_project(&self, id: &str, payload: &UpdateProject) -> ClientResult<Option<Project>> {
            self.0.update_project(id, payload).await
        }
        async fn delete_project(&self, id: &str) -> ClientResult<bool> {
            self.0.delete_project(id).await
        }
        async fn project_goals(&self, project_id: &str) -> ClientResult<Vec<Goal>> {
            self.0.project_goals(project_id).await
        }
        async fn list_goals(&self) -> ClientResult<Vec<Goal>> {
            self.0.list_goals().await
        }
        async fn get_goal(&self, id: &str) -> ClientResult<Option<Goal>> {
            self.0.get_goal(id).await
        }
        async fn create_goal(&self, payload: &CreateGoal) -> ClientResult<Goal> {
            self.0.create_goal(payload).await
        }
        async fn update_goal(&self, id: &str, payload: &UpdateGoal) -> ClientResult<Option<Goal>> {
            self.0.update_goal(id, payload).await
        }
        async fn delete_goal(&self, id: &str) -> ClientResult<bool> {
            self.0.delete_goal(id).await
        }
        async fn goal_tasks(&self, goal_id: &str) -> ClientResult<Vec<Task>> {
            self.0.goal_tasks(goal_id).await
        }
        async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
            self.0.list_tasks().await
        }
        async fn get_task(&self, id: &str) -> ClientResult<Option<Task>> {
            self.0.get_task(id).await
        }
        async fn create_task(&self, payload: &CreateTask) -> ClientResult<Task> {
            self.0.create_task(payload).await
        }
        async fn update_task(&self, id: &str, payload: &UpdateTask) -> ClientResult<Option<Task>> {
            self.0.update_task(id, payload).await
        }
        async fn update_task_status(&self, id: &str, status: TaskStatus) -> ClientResult<Option<Task>> {
            self.0.update_task_status(id, status).await
        }
        async fn delete_task(&self, id: &str) -> ClientResult<bool> {
            self.0.delete_task(id).await
        }
        async fn list_knowledge(&self) -> ClientResult<Vec<KnowledgeBase>> {
            Err(ClientError::Unavailable)
        }
        async fn get_knowledge(&self, _id: &str) -> ClientResult<Option<KnowledgeBase>> {
            Err(ClientError::Unavailable)
        }
        async fn create_knowledge(&self, _payload: &CreateKnowledge) -> ClientResult<KnowledgeBase> {
            Err(ClientError::Unavailable)
        }
        async fn update_knowledge(
            &self,
            _id: &str,
            _payload: &UpdateKnowledge,
        ) -> ClientResult<Option<KnowledgeBase>> {
            Err(ClientError::Unavailable)
        }
        async fn delete_knowledge(&self, _id: &str) -> ClientResult<bool> {
            Err(ClientError::Unavailable)
        }
        async fn knowledge_for_entity(
            &self,
            _kind: EntityKind,
            _entity_id: &str,
        ) -> ClientResult<Vec<KnowledgeBase>> {
            Err(ClientError::Unavailable)
        }
        async fn add_reference(
            &self,
            _knowledge_base_id: &str,
            _reference: &ReferenceRequest,
        ) -> ClientResult<Option<KnowledgeBase>> {
            Err(ClientError::Unavailable)
        }
        async fn remove_reference(
            &self,
            _knowledge_base_id: &str,
            _kind: EntityKind,
            _entity_id: &str,
        ) -> ClientResult<Option<KnowledgeBase>> {
            Err(ClientError::Unavailable)
        }
        async fn upload_attachment(
            &self,
            _knowledge_base_id: &str,
            _filename: &str,
            _bytes: Vec<u8>,
        ) -> ClientResult<Option<String>> {
            Err(ClientError::Unavailable)
        }
        async fn download_attachment(&self, _knowledge_base_id: &str) -> ClientResult<Option<Attachment>> {
            Err(ClientError::Unavailable)
        }
        async fn delete_attachment(&self, _knowledge_base_id: &str) -> ClientResult<bool> {
            Err(ClientError::Unavailable)
        }
        async fn list_dependencies(&self) -> ClientResult<Vec<TaskDependency>> {
            self.0.list_dependencies().await
        }
        async fn add_dependency(&self, request: &DependencyRequest) -> ClientResult<TaskDependency> {
            self.0.add_dependency(request).await
        }
        async fn remove_dependency(&self, task_id: &str, depends_on_task_id: &str) -> ClientResult<bool> {
            self.0.remove_dependency(task_id, depends_on_task_id).await
        }
    }

    #[tokio::test]
    async fn test_knowledge_loading_disables_after_failures() {
        let backend = MemoryBackend::new();
        backend.create_project(&CreateProject::new("Alpha")).await.unwrap();
        let mut app = EventHorizon::with_config(
            FlakyKnowledge(backend),
            KnowledgeConfig {
                max_consecutive_failures: 2,
            },
        );

        let first = app.load_all().await;
        assert_eq!(first.failed.len(), 1);
        assert_eq!(first.failed[0].0, Collection::Knowledge);
        assert!(first.loaded.contains(&Collection::Projects));
        assert_eq!(app.store().projects().len(), 1);

        app.load_all().await;
        assert!(app.knowledge_disabled());

        let third = app.load_all().await;
        assert!(third.knowledge_disabled);
        assert!(third.failed.is_empty());
        assert!(!third.is_complete());

        app.reset_knowledge();
        assert!(!app.knowledge_disabled());
    }

    #[tokio::test]
    async fn test_zero_failure_limit_keeps_loading() {
        let mut app = EventHorizon::with_config(
            FlakyKnowledge(MemoryBackend::new()),
            KnowledgeConfig {
                max_consecutive_failures: 0,
            },
        );

        for _ in 0..3 {
            let report = app.load_all().await;
            assert!(!report.knowledge_disabled);
            assert_eq!(report.failed.len(), 1);
        }
        assert!(!app.knowledge_disabled());
    }
}
