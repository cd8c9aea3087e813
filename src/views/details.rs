//! Task and knowledge base detail views

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{days_until_due, is_overdue};
use crate::model::{EntityKind, KnowledgeBase, Task};
use crate::store::EntityStore;

/// A task with resolved names and its dependency graph neighbours
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: Task,
    pub goal_name: String,
    pub project_id: String,
    pub project_name: String,
    /// Names of tasks this task depends on; missing tasks are skipped
    pub dependencies: Vec<String>,
    pub dependency_ids: Vec<String>,
    /// Names of tasks that depend on this task
    pub blocks_tasks: Vec<String>,
    pub blocked_task_ids: Vec<String>,
    pub is_overdue: bool,
    pub days_until_due: Option<i64>,
}

pub fn task_details(store: &EntityStore, task: &Task, now: DateTime<Utc>) -> TaskDetails {
    let goal = store.goal(&task.goal_id);
    let project_id = goal.map(|g| g.project_id.clone()).unwrap_or_default();
    // Unresolvable tasks keep their id but have no name entry
    let task_names = |ids: &[String]| -> Vec<String> {
        ids.iter()
            .filter_map(|id| store.entity_name(EntityKind::Task, id))
            .map(str::to_string)
            .collect()
    };

    let dependency_ids: Vec<String> = store
        .dependencies()
        .iter()
        .filter(|d| d.task_id == task.id)
        .map(|d| d.depends_on_task_id.clone())
        .collect();
    let blocked_task_ids: Vec<String> = store
        .dependencies()
        .iter()
        .filter(|d| d.depends_on_task_id == task.id)
        .map(|d| d.task_id.clone())
        .collect();

    TaskDetails {
        task: task.clone(),
        goal_name: goal.map(|g| g.name.clone()).unwrap_or_default(),
        project_name: store
            .entity_name(EntityKind::Project, &project_id)
            .unwrap_or_default()
            .to_string(),
        project_id,
        dependencies: task_names(&dependency_ids),
        dependency_ids,
        blocks_tasks: task_names(&blocked_task_ids),
        blocked_task_ids,
        is_overdue: is_overdue(task.due_date, task.status, now),
        days_until_due: days_until_due(task.due_date, now),
    }
}

pub fn task_details_all(store: &EntityStore, now: DateTime<Utc>) -> Vec<TaskDetails> {
    store
        .tasks()
        .iter()
        .map(|t| task_details(store, t, now))
        .collect()
}

/// One resolved knowledge reference
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedReference {
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub name: String,
}

/// A knowledge base document with its references resolved to names.
///
/// Serializes to the backend's wire shape: the document fields plus the
/// parallel `related_entities`, `related_entity_ids` and `entity_types` lists.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KnowledgeWithReferences {
    #[serde(flatten)]
    pub document: KnowledgeBase,
    #[serde(skip)]
    pub references: Vec<ResolvedReference>,
}

/// Resolve a document's references; references to missing entities are skipped
pub fn knowledge_with_references(store: &EntityStore, doc: &KnowledgeBase) -> KnowledgeWithReferences {
    let references: Vec<ResolvedReference> = store
        .references_for(&doc.id)
        .filter_map(|r| {
            store
                .entity_name(r.entity_type, &r.entity_id)
                .map(|name| ResolvedReference {
                    entity_type: r.entity_type,
                    entity_id: r.entity_id.clone(),
                    name: name.to_string(),
                })
        })
        .collect();

    let mut document = doc.clone();
    document.related_entities = references.iter().map(|r| r.name.clone()).collect();
    document.related_entity_ids = references.iter().map(|r| r.entity_id.clone()).collect();
    document.entity_types = references
        .iter()
        .map(|r| r.entity_type.as_str().to_string())
        .collect();

    KnowledgeWithReferences {
        document,
        references,
    }
}

pub fn knowledge_with_references_all(store: &EntityStore) -> Vec<KnowledgeWithReferences> {
    store
        .knowledge()
        .iter()
        .map(|kb| knowledge_with_references(store, kb))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CreateGoal, CreateKnowledge, CreateProject, CreateTask, Goal, KnowledgeReference, Project,
        TaskDependency,
    };
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn store() -> EntityStore {
        let mut store = EntityStore::new();
        store.upsert_project(Project::from_create("p1", CreateProject::new("Alpha"), now()));
        store.upsert_goal(Goal::from_create("g1", CreateGoal::new("G1", "p1"), now()));
        for (id, name) in [("t1", "Design"), ("t2", "Build"), ("t3", "Ship")] {
            store.upsert_task(Task::from_create(id, CreateTask::new(name, "g1"), now()));
        }
        for (task_id, on) in [("t2", "t1"), ("t3", "t2"), ("t3", "t-gone")] {
            store.add_dependency(TaskDependency {
                id: format!("{}-{}", task_id, on),
                task_id: task_id.into(),
                depends_on_task_id: on.into(),
                created_at: now(),
            });
        }
        store
    }

    #[test]
    fn test_task_details_graph() {
        let store = store();
        let details = task_details_all(&store, now());

        let build = details.iter().find(|d| d.task.id == "t2").unwrap();
        assert_eq!(build.goal_name, "G1");
        assert_eq!(build.project_id, "p1");
        assert_eq!(build.project_name, "Alpha");
        assert_eq!(build.dependencies, vec!["Design"]);
        assert_eq!(build.blocks_tasks, vec!["Ship"]);
        assert_eq!(build.blocked_task_ids, vec!["t3"]);

        let ship = details.iter().find(|d| d.task.id == "t3").unwrap();
        assert_eq!(ship.dependency_ids, vec!["t2", "t-gone"]);
        assert_eq!(ship.dependencies, vec!["Build"]);
        assert!(!ship.is_overdue);
        assert_eq!(ship.days_until_due, None);
    }

    #[test]
    fn test_orphan_task_has_empty_names() {
        let store = store();
        let orphan = Task::from_create(
            "t9",
            CreateTask::new("Orphan", "g-gone").due(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
            now(),
        );
        let details = task_details(&store, &orphan, now());
        assert_eq!(details.goal_name, "");
        assert_eq!(details.project_name, "");
        assert!(details.is_overdue);
        assert_eq!(details.days_until_due, Some(-9));
    }

    #[test]
    fn test_knowledge_references_resolved() {
        let mut store = store();
        store.upsert_knowledge(KnowledgeBase::from_create("kb1", CreateKnowledge::new("Notes"), now()));
        for (kind, id) in [
            (EntityKind::Project, "p1"),
            (EntityKind::Task, "t-gone"),
            (EntityKind::Task, "t3"),
        ] {
            store.add_reference(KnowledgeReference {
                knowledge_base_id: "kb1".into(),
                entity_type: kind,
                entity_id: id.into(),
            });
        }

        let all = knowledge_with_references_all(&store);
        let view = &all[0];
        assert_eq!(view.references.len(), 2);
        assert_eq!(view.document.related_entities, vec!["Alpha", "Ship"]);
        assert_eq!(view.document.related_entity_ids, vec!["p1", "t3"]);
        assert_eq!(view.document.entity_types, vec!["project", "task"]);

        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["document_name"], "Notes");
        assert_eq!(json["entity_types"][1], "task");
        assert!(json.get("references").is_none());
    }
}
