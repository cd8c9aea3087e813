//! In-memory Entity Store
//!
//! Client-side cache of every collection fetched from the backend. The store
//! is the single source for derived views; it enforces the hierarchy's cascade
//! rules locally so the cache mirrors what the backend does on delete:
//!
//! ```text
//! remove_project ─> goals of project and their descendants ─> their tasks
//! remove_goal    ─> child goals ─> tasks of all removed goals
//! remove_task    ─> dependencies touching the task
//! any removal    ─> knowledge references pointing at removed entities
//! ```
//!
//! Every mutation bumps a revision counter and publishes a [`StoreEvent`] on a
//! broadcast channel so observers know to recompute their views.

mod events;

pub use events::{CascadeReport, Collection, StoreEvent};

use std::collections::HashSet;
use tokio::sync::broadcast;

use crate::model::{
    Entity, EntityKind, Goal, KnowledgeBase, KnowledgeReference, Project, Task, TaskDependency,
};

/// Capacity of the change-event channel
const EVENT_CAPACITY: usize = 256;

/// Owned cache of all entity collections
pub struct EntityStore {
    projects: Vec<Project>,
    goals: Vec<Goal>,
    tasks: Vec<Task>,
    knowledge: Vec<KnowledgeBase>,
    references: Vec<KnowledgeReference>,
    dependencies: Vec<TaskDependency>,
    revision: u64,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace the entity with the same id, or append it
fn upsert<T: Entity>(items: &mut Vec<T>, item: T) {
    match items.iter().position(|existing| existing.id() == item.id()) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

impl EntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            projects: Vec::new(),
            goals: Vec::new(),
            tasks: Vec::new(),
            knowledge: Vec::new(),
            references: Vec::new(),
            dependencies: Vec::new(),
            revision: 0,
            events,
        }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Monotonic counter bumped by every mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn publish(&mut self, event: StoreEvent) {
        self.revision += 1;
        tracing::trace!(revision = self.revision, ?event, "Store changed");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ============================================
    // Read access
    // ============================================

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn knowledge(&self) -> &[KnowledgeBase] {
        &self.knowledge
    }

    pub fn references(&self) -> &[KnowledgeReference] {
        &self.references
    }

    pub fn dependencies(&self) -> &[TaskDependency] {
        &self.dependencies
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn knowledge_item(&self, id: &str) -> Option<&KnowledgeBase> {
        self.knowledge.iter().find(|kb| kb.id == id)
    }

    /// Whether an entity of the given kind is cached
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.entity_name(kind, id).is_some()
    }

    /// Display name of a cached project, goal or task
    pub fn entity_name(&self, kind: EntityKind, id: &str) -> Option<&str> {
        match kind {
            EntityKind::Project => self.project(id).map(|p| p.name.as_str()),
            EntityKind::Goal => self.goal(id).map(|g| g.name.as_str()),
            EntityKind::Task => self.task(id).map(|t| t.name.as_str()),
        }
    }

    // ============================================
    // Relationship queries
    // ============================================

    pub fn goals_for_project<'a>(&'a self, project_id: &'a str) -> impl Iterator<Item = &'a Goal> + 'a {
        self.goals.iter().filter(move |g| g.project_id == project_id)
    }

    pub fn tasks_for_goal<'a>(&'a self, goal_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| t.goal_id == goal_id)
    }

    /// Tasks whose owning goal belongs to the project
    pub fn tasks_for_project<'a>(&'a self, project_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| {
            self.goal(&t.goal_id)
                .map(|g| g.project_id == project_id)
                .unwrap_or(false)
        })
    }

    pub fn child_goals<'a>(&'a self, parent_goal_id: &'a str) -> impl Iterator<Item = &'a Goal> + 'a {
        self.goals
            .iter()
            .filter(move |g| g.parent_goal_id.as_deref() == Some(parent_goal_id))
    }

    /// Knowledge base documents referencing an entity
    pub fn knowledge_for<'a>(
        &'a self,
        kind: EntityKind,
        entity_id: &'a str,
    ) -> impl Iterator<Item = &'a KnowledgeBase> + 'a {
        self.knowledge.iter().filter(move |kb| {
            self.references.iter().any(|r| {
                r.knowledge_base_id == kb.id && r.entity_type == kind && r.entity_id == entity_id
            })
        })
    }

    pub fn references_for<'a>(
        &'a self,
        knowledge_base_id: &'a str,
    ) -> impl Iterator<Item = &'a KnowledgeReference> + 'a {
        self.references
            .iter()
            .filter(move |r| r.knowledge_base_id == knowledge_base_id)
    }

    // ============================================
    // Bulk replacement (initial load / refresh)
    // ============================================

    pub fn replace_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        self.publish(StoreEvent::Replaced(Collection::Projects));
    }

    pub fn replace_goals(&mut self, goals: Vec<Goal>) {
        self.goals = goals;
        self.publish(StoreEvent::Replaced(Collection::Goals));
    }

    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.publish(StoreEvent::Replaced(Collection::Tasks));
    }

    /// Replace all documents and rebuild references from their wire lists
    pub fn replace_knowledge(&mut self, knowledge: Vec<KnowledgeBase>) {
        self.references = knowledge.iter().flat_map(|kb| kb.references()).collect();
        self.knowledge = knowledge;
        self.publish(StoreEvent::Replaced(Collection::Knowledge));
    }

    pub fn replace_dependencies(&mut self, dependencies: Vec<TaskDependency>) {
        self.dependencies = dependencies;
        self.publish(StoreEvent::Replaced(Collection::Dependencies));
    }

    // ============================================
    // Single-entity writes
    // ============================================

    pub fn upsert_project(&mut self, project: Project) {
        let id = project.id.clone();
        upsert(&mut self.projects, project);
        self.publish(StoreEvent::Upserted(Collection::Projects, id));
    }

    pub fn upsert_goal(&mut self, goal: Goal) {
        let id = goal.id.clone();
        upsert(&mut self.goals, goal);
        self.publish(StoreEvent::Upserted(Collection::Goals, id));
    }

    pub fn upsert_task(&mut self, task: Task) {
        let id = task.id.clone();
        upsert(&mut self.tasks, task);
        self.publish(StoreEvent::Upserted(Collection::Tasks, id));
    }

    /// Insert or replace a document; its wire reference lists become authoritative
    pub fn upsert_knowledge(&mut self, item: KnowledgeBase) {
        let id = item.id.clone();
        self.references.retain(|r| r.knowledge_base_id != id);
        self.references.extend(item.references());
        upsert(&mut self.knowledge, item);
        self.publish(StoreEvent::Upserted(Collection::Knowledge, id));
    }

    /// Add a reference; returns false if it already existed
    pub fn add_reference(&mut self, reference: KnowledgeReference) -> bool {
        if self.references.contains(&reference) {
            return false;
        }
        let id = reference.knowledge_base_id.clone();
        self.references.push(reference);
        self.publish(StoreEvent::Upserted(Collection::References, id));
        true
    }

    /// Remove a reference; the referenced entity is untouched
    pub fn remove_reference(&mut self, reference: &KnowledgeReference) -> bool {
        let before = self.references.len();
        self.references.retain(|r| r != reference);
        if self.references.len() == before {
            return false;
        }
        self.publish(StoreEvent::Removed(
            Collection::References,
            vec![reference.knowledge_base_id.clone()],
        ));
        true
    }

    /// Add a dependency; returns false if the same pair already existed
    pub fn add_dependency(&mut self, dependency: TaskDependency) -> bool {
        let exists = self.dependencies.iter().any(|d| {
            d.task_id == dependency.task_id && d.depends_on_task_id == dependency.depends_on_task_id
        });
        if exists {
            return false;
        }
        let id = dependency.id.clone();
        self.dependencies.push(dependency);
        self.publish(StoreEvent::Upserted(Collection::Dependencies, id));
        true
    }

    pub fn remove_dependency(&mut self, task_id: &str, depends_on_task_id: &str) -> bool {
        let removed: Vec<String> = self
            .dependencies
            .iter()
            .filter(|d| d.task_id == task_id && d.depends_on_task_id == depends_on_task_id)
            .map(|d| d.id.clone())
            .collect();
        if removed.is_empty() {
            return false;
        }
        self.dependencies
            .retain(|d| !(d.task_id == task_id && d.depends_on_task_id == depends_on_task_id));
        self.publish(StoreEvent::Removed(Collection::Dependencies, removed));
        true
    }

    // ============================================
    // Cascading removal
    // ============================================

    /// Remove a project with its goals and their tasks
    pub fn remove_project(&mut self, id: &str) -> Option<CascadeReport> {
        self.project(id)?;

        let roots: Vec<String> = self.goals_for_project(id).map(|g| g.id.clone()).collect();
        let goal_ids = self.with_descendants(roots);
        let mut report = self.remove_goals_and_tasks(&goal_ids);

        self.projects.retain(|p| p.id != id);
        report.projects.push(id.to_string());
        report.references += self.drop_references(EntityKind::Project, &report.projects);

        self.publish(StoreEvent::Cascade(report.clone()));
        Some(report)
    }

    /// Remove a goal, its descendant goals and all their tasks
    pub fn remove_goal(&mut self, id: &str) -> Option<CascadeReport> {
        self.goal(id)?;

        let goal_ids = self.with_descendants(vec![id.to_string()]);
        let report = self.remove_goals_and_tasks(&goal_ids);
        self.publish(StoreEvent::Cascade(report.clone()));
        Some(report)
    }

    /// Remove a task and every dependency touching it
    pub fn remove_task(&mut self, id: &str) -> Option<CascadeReport> {
        self.task(id)?;
        let report = self.remove_tasks(&[id.to_string()]);
        self.publish(StoreEvent::Cascade(report.clone()));
        Some(report)
    }

    /// Remove a document and its references
    pub fn remove_knowledge(&mut self, id: &str) -> Option<CascadeReport> {
        self.knowledge_item(id)?;
        self.knowledge.retain(|kb| kb.id != id);

        let before = self.references.len();
        self.references.retain(|r| r.knowledge_base_id != id);

        let report = CascadeReport {
            knowledge: vec![id.to_string()],
            references: before - self.references.len(),
            ..Default::default()
        };
        self.publish(StoreEvent::Cascade(report.clone()));
        Some(report)
    }

    /// The given goals followed by all their descendants, breadth first
    fn with_descendants(&self, mut goal_ids: Vec<String>) -> Vec<String> {
        let mut cursor = 0;
        while cursor < goal_ids.len() {
            let children: Vec<String> = self
                .child_goals(&goal_ids[cursor])
                .map(|g| g.id.clone())
                .filter(|child| !goal_ids.contains(child))
                .collect();
            goal_ids.extend(children);
            cursor += 1;
        }
        goal_ids
    }

    fn remove_goals_and_tasks(&mut self, goal_ids: &[String]) -> CascadeReport {
        let goal_set: HashSet<&str> = goal_ids.iter().map(String::as_str).collect();
        let task_ids: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| goal_set.contains(t.goal_id.as_str()))
            .map(|t| t.id.clone())
            .collect();

        let mut report = self.remove_tasks(&task_ids);

        self.goals.retain(|g| !goal_set.contains(g.id.as_str()));
        report.goals = goal_ids.to_vec();
        report.references += self.drop_references(EntityKind::Goal, goal_ids);
        report
    }

    fn remove_tasks(&mut self, task_ids: &[String]) -> CascadeReport {
        let task_set: HashSet<&str> = task_ids.iter().map(String::as_str).collect();

        self.tasks.retain(|t| !task_set.contains(t.id.as_str()));

        let before = self.dependencies.len();
        self.dependencies.retain(|d| {
            !task_set.contains(d.task_id.as_str()) && !task_set.contains(d.depends_on_task_id.as_str())
        });
        let dependencies = before - self.dependencies.len();

        CascadeReport {
            tasks: task_ids.to_vec(),
            dependencies,
            references: self.drop_references(EntityKind::Task, task_ids),
            ..Default::default()
        }
    }

    fn drop_references(&mut self, kind: EntityKind, ids: &[String]) -> usize {
        let before = self.references.len();
        self.references
            .retain(|r| !(r.entity_type == kind && ids.contains(&r.entity_id)));
        before - self.references.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateGoal, CreateKnowledge, CreateProject, CreateTask, GoalScope};
    use chrono::Utc;

    fn project(id: &str) -> Project {
        Project::from_create(id, CreateProject::new(format!("Project {}", id)), Utc::now())
    }

    fn goal(id: &str, project_id: &str) -> Goal {
        Goal::from_create(id, CreateGoal::new(format!("Goal {}", id), project_id), Utc::now())
    }

    fn task(id: &str, goal_id: &str) -> Task {
        Task::from_create(id, CreateTask::new(format!("Task {}", id), goal_id), Utc::now())
    }

    fn dependency(task_id: &str, depends_on: &str) -> TaskDependency {
        TaskDependency {
            id: format!("{}->{}", task_id, depends_on),
            task_id: task_id.to_string(),
            depends_on_task_id: depends_on.to_string(),
            created_at: Utc::now(),
        }
    }

    fn reference(kb: &str, kind: EntityKind, id: &str) -> KnowledgeReference {
        KnowledgeReference {
            knowledge_base_id: kb.to_string(),
            entity_type: kind,
            entity_id: id.to_string(),
        }
    }

    fn seeded() -> EntityStore {
        let mut store = EntityStore::new();
        store.replace_projects(vec![project("p1"), project("p2")]);
        store.replace_goals(vec![goal("g1", "p1"), goal("g2", "p1"), goal("g3", "p2")]);
        store.replace_tasks(vec![
            task("t1", "g1"),
            task("t2", "g1"),
            task("t3", "g2"),
            task("t4", "g3"),
        ]);
        store.replace_knowledge(vec![KnowledgeBase::from_create(
            "kb1",
            CreateKnowledge::new("Notes"),
            Utc::now(),
        )]);
        store.replace_dependencies(vec![dependency("t4", "t1")]);
        store.add_reference(reference("kb1", EntityKind::Task, "t1"));
        store.add_reference(reference("kb1", EntityKind::Project, "p2"));
        store
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = seeded();
        let mut renamed = store.project("p1").unwrap().clone();
        renamed.name = "Renamed".to_string();

        store.upsert_project(renamed);
        assert_eq!(store.projects().len(), 2);
        assert_eq!(store.projects()[0].name, "Renamed");

        store.upsert_project(project("p3"));
        assert_eq!(store.projects().len(), 3);
        assert_eq!(store.projects()[2].id, "p3");
    }

    #[test]
    fn test_remove_project_cascades() {
        let mut store = seeded();

        let report = store.remove_project("p1").unwrap();
        assert_eq!(report.projects, vec!["p1"]);
        assert_eq!(report.goals.len(), 2);
        assert_eq!(report.tasks.len(), 3);
        assert_eq!(report.dependencies, 1);
        assert_eq!(report.references, 1);

        assert!(store.project("p1").is_none());
        assert!(store.goals().iter().all(|g| g.project_id != "p1"));
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, "t4");
        assert!(store.dependencies().is_empty());

        // Document survives, only the dangling reference is gone
        assert!(store.knowledge_item("kb1").is_some());
        assert_eq!(store.references().len(), 1);
    }

    #[test]
    fn test_remove_goal_cascades_to_tasks_and_children() {
        let mut store = seeded();
        let mut milestone = goal("g4", "p1");
        milestone.scope = Some(GoalScope::WeeklyMilestone);
        milestone.parent_goal_id = Some("g1".to_string());
        store.upsert_goal(milestone);
        store.upsert_task(task("t5", "g4"));

        let report = store.remove_goal("g1").unwrap();
        assert_eq!(report.goals, vec!["g1", "g4"]);
        assert_eq!(report.tasks.len(), 3);
        assert!(store.goal("g2").is_some());
        assert!(store.task("t3").is_some());
        assert!(store.task("t5").is_none());
    }

    #[test]
    fn test_remove_project_takes_children_parented_across_projects() {
        let mut store = seeded();
        let mut milestone = goal("g4", "p2");
        milestone.scope = Some(GoalScope::WeeklyMilestone);
        milestone.parent_goal_id = Some("g1".to_string());
        store.upsert_goal(milestone);

        let report = store.remove_project("p1").unwrap();
        assert!(report.goals.contains(&"g4".to_string()));
        assert!(store
            .goals()
            .iter()
            .all(|g| g.parent_goal_id.as_deref().map_or(true, |p| store.goal(p).is_some())));
    }

    #[test]
    fn test_remove_missing_returns_none() {
        let mut store = seeded();
        let revision = store.revision();
        assert!(store.remove_project("nope").is_none());
        assert!(store.remove_goal("nope").is_none());
        assert!(store.remove_task("nope").is_none());
        assert!(store.remove_knowledge("nope").is_none());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_remove_reference_keeps_entity() {
        let mut store = seeded();
        let r = reference("kb1", EntityKind::Project, "p2");

        assert!(store.remove_reference(&r));
        assert!(!store.remove_reference(&r));
        assert!(store.project("p2").is_some());
        assert_eq!(store.knowledge_for(EntityKind::Project, "p2").count(), 0);
        assert_eq!(store.knowledge_for(EntityKind::Task, "t1").count(), 1);
    }

    #[test]
    fn test_idempotent_relations() {
        let mut store = seeded();
        assert!(!store.add_reference(reference("kb1", EntityKind::Task, "t1")));
        assert!(!store.add_dependency(dependency("t4", "t1")));
        assert!(store.add_dependency(dependency("t2", "t1")));
        assert!(store.remove_dependency("t2", "t1"));
        assert!(!store.remove_dependency("t2", "t1"));
    }

    #[test]
    fn test_relationship_queries() {
        let store = seeded();
        assert_eq!(store.goals_for_project("p1").count(), 2);
        assert_eq!(store.tasks_for_goal("g1").count(), 2);
        assert_eq!(store.tasks_for_project("p1").count(), 3);
        assert_eq!(store.tasks_for_project("p2").count(), 1);
        assert_eq!(store.entity_name(EntityKind::Goal, "g3"), Some("Goal g3"));
        assert!(!store.contains(EntityKind::Task, "t9"));
    }

    #[tokio::test]
    async fn test_events_published() {
        let mut store = EntityStore::new();
        let mut rx = store.subscribe();

        store.upsert_project(project("p1"));
        store.remove_project("p1");

        assert_eq!(
            rx.recv().await.unwrap(),
            StoreEvent::Upserted(Collection::Projects, "p1".to_string())
        );
        match rx.recv().await.unwrap() {
            StoreEvent::Cascade(report) => assert_eq!(report.projects, vec!["p1"]),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(store.revision(), 2);
    }
}
