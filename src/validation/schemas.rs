//! Per-entity create and update schemas

use std::collections::HashSet;

use super::{ValidationResult, Validator};
use crate::model::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, EntityKind, GoalScope, UpdateGoal,
    UpdateKnowledge, UpdateProject, UpdateTask,
};
use crate::store::EntityStore;

// ============================================
// PROJECT
// ============================================

pub fn validate_create_project(payload: &CreateProject) -> ValidationResult {
    let mut v = Validator::new();
    v.name("name", &payload.name)
        .positive("time_estimate_months", payload.time_estimate_months);
    check_date_range(&mut v, payload.start_date, payload.end_date);
    v.finish()
}

/// Dates the update leaves unset are taken from the cached project
pub fn validate_update_project(
    payload: &UpdateProject,
    store: &EntityStore,
    project_id: &str,
) -> ValidationResult {
    let mut v = Validator::new();
    v.optional_name("name", payload.name.as_deref())
        .positive("time_estimate_months", payload.time_estimate_months);

    let current = store.project(project_id);
    let start = payload.start_date.or_else(|| current.and_then(|p| p.start_date));
    let end = payload.end_date.or_else(|| current.and_then(|p| p.end_date));
    check_date_range(&mut v, start, end);
    v.finish()
}

fn check_date_range(
    v: &mut Validator,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) {
    if let (Some(start), Some(end)) = (start, end) {
        v.check(end >= start, "end_date", "must not be before start_date");
    }
}

// ============================================
// GOAL
// ============================================

pub fn validate_create_goal(payload: &CreateGoal, store: &EntityStore) -> ValidationResult {
    let mut v = Validator::new();
    v.name("name", &payload.name).required_id("project_id", &payload.project_id);

    if !payload.project_id.trim().is_empty() {
        v.check(
            store.project(&payload.project_id).is_some(),
            "project_id",
            format!("project '{}' does not exist", payload.project_id),
        );
    }

    check_parent(
        &mut v,
        store,
        None,
        Some(&payload.project_id),
        payload.scope,
        payload.parent_goal_id.as_deref(),
    );
    v.finish()
}

/// Scope and parent rules are checked against the goal as it will be after the update.
///
/// The goal hierarchy stays a tree: a goal cannot move under one of its own
/// descendants, and a goal with child goals keeps a scope that can parent them.
pub fn validate_update_goal(
    goal_id: &str,
    payload: &UpdateGoal,
    store: &EntityStore,
) -> ValidationResult {
    let mut v = Validator::new();
    v.optional_name("name", payload.name.as_deref());

    let current = store.goal(goal_id);
    let scope = payload.scope.or_else(|| current.and_then(|g| g.scope));
    let parent = payload
        .parent_goal_id
        .as_deref()
        .or_else(|| current.and_then(|g| g.parent_goal_id.as_deref()));

    if !scope.map_or(false, GoalScope::can_parent) && store.child_goals(goal_id).next().is_some() {
        v.check(
            false,
            "scope",
            "a goal with child goals must have scope Monthly or Quarterly",
        );
    }

    let project_id = current.map(|g| g.project_id.as_str());
    check_parent(&mut v, store, Some(goal_id), project_id, scope, parent);
    v.finish()
}

fn check_parent(
    v: &mut Validator,
    store: &EntityStore,
    goal_id: Option<&str>,
    project_id: Option<&str>,
    scope: Option<GoalScope>,
    parent_goal_id: Option<&str>,
) {
    let parent_goal_id = parent_goal_id.filter(|id| !id.trim().is_empty());

    if scope.map_or(false, GoalScope::requires_parent) && parent_goal_id.is_none() {
        v.check(
            false,
            "parent_goal_id",
            "Weekly-Milestone goals require a parent goal",
        );
    }

    let Some(parent_id) = parent_goal_id else {
        return;
    };

    if goal_id == Some(parent_id) {
        v.check(false, "parent_goal_id", "a goal cannot be its own parent");
        return;
    }

    match store.goal(parent_id) {
        None => {
            v.check(
                false,
                "parent_goal_id",
                format!("goal '{}' does not exist", parent_id),
            );
        }
        Some(parent) => {
            v.check(
                parent.scope.map_or(false, GoalScope::can_parent),
                "parent_goal_id",
                "parent goal must have scope Monthly or Quarterly",
            );
            if let Some(project_id) = project_id {
                v.check(
                    parent.project_id == project_id,
                    "parent_goal_id",
                    "parent goal must belong to the same project",
                );
            }
            if let Some(goal_id) = goal_id {
                v.check(
                    !is_ancestor(store, goal_id, parent_id),
                    "parent_goal_id",
                    "a goal cannot be moved under its own descendant",
                );
            }
        }
    }
}

/// Whether `ancestor` appears on the parent chain starting at `goal_id`
fn is_ancestor(store: &EntityStore, ancestor: &str, goal_id: &str) -> bool {
    let mut seen = HashSet::new();
    let mut cursor = Some(goal_id);
    while let Some(current) = cursor {
        if current == ancestor {
            return true;
        }
        if !seen.insert(current) {
            return false;
        }
        cursor = store.goal(current).and_then(|g| g.parent_goal_id.as_deref());
    }
    false
}

// ============================================
// TASK
// ============================================

pub fn validate_create_task(payload: &CreateTask, store: &EntityStore) -> ValidationResult {
    let mut v = Validator::new();
    v.name("name", &payload.name)
        .required_id("goal_id", &payload.goal_id)
        .positive("time_estimate_minutes", payload.time_estimate_minutes);

    if !payload.goal_id.trim().is_empty() {
        check_goal_exists(&mut v, store, &payload.goal_id);
    }
    v.finish()
}

pub fn validate_update_task(payload: &UpdateTask, store: &EntityStore) -> ValidationResult {
    let mut v = Validator::new();
    v.optional_name("name", payload.name.as_deref())
        .positive("time_estimate_minutes", payload.time_estimate_minutes);

    if let Some(goal_id) = &payload.goal_id {
        v.required_id("goal_id", goal_id);
        if !goal_id.trim().is_empty() {
            check_goal_exists(&mut v, store, goal_id);
        }
    }
    v.finish()
}

fn check_goal_exists(v: &mut Validator, store: &EntityStore, goal_id: &str) {
    v.check(
        store.goal(goal_id).is_some(),
        "goal_id",
        format!("goal '{}' does not exist", goal_id),
    );
}

// ============================================
// KNOWLEDGE BASE
// ============================================

pub fn validate_create_knowledge(
    payload: &CreateKnowledge,
    store: &EntityStore,
) -> ValidationResult {
    let mut v = Validator::new();
    v.name("document_name", &payload.document_name);
    check_citations(&mut v, &payload.link_citations);

    for (kind, id) in payload.relations() {
        let field = match kind {
            EntityKind::Project => "related_projects",
            EntityKind::Goal => "related_goals",
            EntityKind::Task => "related_tasks",
        };
        v.check(
            store.contains(kind, id),
            field,
            format!("{} '{}' does not exist", kind, id),
        );
    }
    v.finish()
}

pub fn validate_update_knowledge(payload: &UpdateKnowledge) -> ValidationResult {
    let mut v = Validator::new();
    v.optional_name("document_name", payload.document_name.as_deref());
    if let Some(citations) = &payload.link_citations {
        check_citations(&mut v, citations);
    }
    v.finish()
}

fn check_citations(v: &mut Validator, citations: &[String]) {
    v.check(
        citations.iter().all(|c| !c.trim().is_empty()),
        "link_citations",
        "citations cannot be empty",
    );
}

// ============================================
// RELATIONS
// ============================================

pub fn validate_reference(
    knowledge_base_id: &str,
    kind: EntityKind,
    entity_id: &str,
    store: &EntityStore,
) -> ValidationResult {
    let mut v = Validator::new();
    v.check(
        store.knowledge_item(knowledge_base_id).is_some(),
        "knowledge_base_id",
        format!("knowledge base item '{}' does not exist", knowledge_base_id),
    )
    .check(
        store.contains(kind, entity_id),
        "entity_id",
        format!("{} '{}' does not exist", kind, entity_id),
    );
    v.finish()
}

/// Both tasks must exist and the new edge must not close a cycle
pub fn validate_dependency(
    task_id: &str,
    depends_on_task_id: &str,
    store: &EntityStore,
) -> ValidationResult {
    let mut v = Validator::new();
    v.check(
        store.task(task_id).is_some(),
        "task_id",
        format!("task '{}' does not exist", task_id),
    )
    .check(
        store.task(depends_on_task_id).is_some(),
        "depends_on_task_id",
        format!("task '{}' does not exist", depends_on_task_id),
    );

    if task_id == depends_on_task_id {
        v.check(false, "depends_on_task_id", "a task cannot depend on itself");
    } else if reaches(store, depends_on_task_id, task_id) {
        v.check(
            false,
            "depends_on_task_id",
            "dependency would create a cycle",
        );
    }
    v.finish()
}

/// Whether `from` transitively depends on `target`
fn reaches(store: &EntityStore, from: &str, target: &str) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        stack.extend(
            store
                .dependencies()
                .iter()
                .filter(|d| d.task_id == current)
                .map(|d| d.depends_on_task_id.as_str()),
        );
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Goal, Project, Task, TaskDependency};
    use chrono::{NaiveDate, Utc};

    fn store() -> EntityStore {
        let now = Utc::now();
        let mut store = EntityStore::new();
        store.upsert_project(Project::from_create("p1", CreateProject::new("Alpha"), now));
        store.upsert_goal(Goal::from_create(
            "g-month",
            CreateGoal::new("Monthly", "p1").scope(GoalScope::Monthly),
            now,
        ));
        store.upsert_goal(Goal::from_create(
            "g-week",
            CreateGoal::new("Week 1", "p1")
                .scope(GoalScope::WeeklyMilestone)
                .parent("g-month"),
            now,
        ));
        for id in ["t1", "t2", "t3"] {
            store.upsert_task(Task::from_create(id, CreateTask::new(id, "g-month"), now));
        }
        store
    }

    fn depend(store: &mut EntityStore, task_id: &str, on: &str) {
        store.add_dependency(TaskDependency {
            id: format!("{}-{}", task_id, on),
            task_id: task_id.into(),
            depends_on_task_id: on.into(),
            created_at: Utc::now(),
        });
    }

    #[test]
    fn test_weekly_milestone_requires_parent() {
        let store = store();
        let payload = CreateGoal::new("W2", "p1").scope(GoalScope::WeeklyMilestone);
        let err = validate_create_goal(&payload, &store).unwrap_err();
        assert!(err.has_field("parent_goal_id"));

        let payload = payload.parent("g-month");
        assert!(validate_create_goal(&payload, &store).is_ok());
    }

    #[test]
    fn test_parent_must_be_monthly_or_quarterly() {
        let store = store();
        let payload = CreateGoal::new("W2", "p1")
            .scope(GoalScope::WeeklyMilestone)
            .parent("g-week");
        let err = validate_create_goal(&payload, &store).unwrap_err();
        assert!(err.to_string().contains("Monthly or Quarterly"));

        let missing = CreateGoal::new("W2", "p1").parent("nope");
        assert!(validate_create_goal(&missing, &store).is_err());
    }

    #[test]
    fn test_goal_requires_existing_project() {
        let store = store();
        let err = validate_create_goal(&CreateGoal::new("G", "p9"), &store).unwrap_err();
        assert!(err.has_field("project_id"));

        let err = validate_create_goal(&CreateGoal::new("", ""), &store).unwrap_err();
        assert!(err.has_field("name"));
        assert_eq!(err.for_field("project_id").count(), 1);
    }

    #[test]
    fn test_update_goal_merges_current_state() {
        let store = store();

        // Switching a parentless goal to Weekly-Milestone needs a parent
        let update = UpdateGoal {
            scope: Some(GoalScope::WeeklyMilestone),
            ..Default::default()
        };
        assert!(validate_update_goal("g-month", &update, &store).is_err());

        // Renaming an existing milestone keeps its parent
        let rename = UpdateGoal {
            name: Some("Week one".into()),
            ..Default::default()
        };
        assert!(validate_update_goal("g-week", &rename, &store).is_ok());

        let own_parent = UpdateGoal {
            parent_goal_id: Some("g-month".into()),
            ..Default::default()
        };
        let err = validate_update_goal("g-month", &own_parent, &store).unwrap_err();
        assert!(err.to_string().contains("own parent"));
    }

    #[test]
    fn test_goal_cannot_move_under_descendant() {
        let mut store = store();
        store.upsert_goal(Goal::from_create(
            "g-quarter",
            CreateGoal::new("Q3", "p1").scope(GoalScope::Quarterly),
            Utc::now(),
        ));
        let mut month = store.goal("g-month").unwrap().clone();
        month.parent_goal_id = Some("g-quarter".into());
        store.upsert_goal(month);

        let under_child = UpdateGoal {
            parent_goal_id: Some("g-month".into()),
            ..Default::default()
        };
        let err = validate_update_goal("g-quarter", &under_child, &store).unwrap_err();
        assert!(err.to_string().contains("own descendant"));
    }

    #[test]
    fn test_goal_with_children_keeps_parent_scope() {
        let store = store();
        let demote = UpdateGoal {
            scope: Some(GoalScope::WeeklyMilestone),
            parent_goal_id: Some("g-other".into()),
            ..Default::default()
        };
        let err = validate_update_goal("g-month", &demote, &store).unwrap_err();
        assert!(err.has_field("scope"));

        let quarterly = UpdateGoal {
            scope: Some(GoalScope::Quarterly),
            ..Default::default()
        };
        assert!(validate_update_goal("g-month", &quarterly, &store).is_ok());
    }

    #[test]
    fn test_parent_must_share_project() {
        let mut store = store();
        store.upsert_project(Project::from_create("p2", CreateProject::new("Beta"), Utc::now()));

        let payload = CreateGoal::new("W", "p2")
            .scope(GoalScope::WeeklyMilestone)
            .parent("g-month");
        let err = validate_create_goal(&payload, &store).unwrap_err();
        assert!(err.to_string().contains("same project"));
    }

    #[test]
    fn test_task_rules() {
        let store = store();
        assert!(validate_create_task(&CreateTask::new("T", "g-month"), &store).is_ok());

        let err =
            validate_create_task(&CreateTask::new("T", "g-none").estimate(0), &store).unwrap_err();
        assert!(err.has_field("goal_id"));
        assert!(err.has_field("time_estimate_minutes"));

        let update = UpdateTask {
            goal_id: Some("g-none".into()),
            ..Default::default()
        };
        assert!(validate_update_task(&update, &store).is_err());
    }

    #[test]
    fn test_project_date_range() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let payload = CreateProject::new("Alpha").dates(Some(start), Some(end));
        let err = validate_create_project(&payload).unwrap_err();
        assert!(err.has_field("end_date"));

        let payload = CreateProject::new("Alpha").dates(Some(end), Some(start));
        assert!(validate_create_project(&payload).is_ok());

        let err = validate_create_project(&CreateProject::new("A").estimate_months(0)).unwrap_err();
        assert!(err.has_field("time_estimate_months"));
    }

    #[test]
    fn test_knowledge_rules() {
        let store = store();
        let ok = CreateKnowledge::new("Notes")
            .citation("https://example.com")
            .relate(EntityKind::Task, "t1");
        assert!(validate_create_knowledge(&ok, &store).is_ok());

        let bad = CreateKnowledge::new(" ")
            .citation("")
            .relate(EntityKind::Goal, "g-none");
        let err = validate_create_knowledge(&bad, &store).unwrap_err();
        assert!(err.has_field("document_name"));
        assert!(err.has_field("link_citations"));
        assert!(err.has_field("related_goals"));
    }

    #[test]
    fn test_dependency_cycles_rejected() {
        let mut store = store();
        depend(&mut store, "t2", "t1");
        depend(&mut store, "t3", "t2");

        assert!(validate_dependency("t3", "t1", &store).is_ok());
        assert!(validate_dependency("t1", "t1", &store).is_err());

        let err = validate_dependency("t1", "t3", &store).unwrap_err();
        assert!(err.to_string().contains("cycle"));

        let err = validate_dependency("t1", "t9", &store).unwrap_err();
        assert!(err.has_field("depends_on_task_id"));
    }
}
