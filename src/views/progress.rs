//! Project and goal aggregates

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{days_until_due, is_overdue, percentage};
use crate::model::{EntityKind, Goal, Project, Task};
use crate::store::EntityStore;

/// A project with goal and task rollups
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectDashboard {
    #[serde(flatten)]
    pub project: Project,
    pub total_goals: usize,
    pub completed_goals: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub task_progress_percentage: u32,
    pub goal_progress_percentage: u32,
    pub total_estimated_minutes: i64,
    pub completed_estimated_minutes: i64,
}

/// A goal with task rollups and due-date state
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GoalProgress {
    #[serde(flatten)]
    pub goal: Goal,
    pub project_name: String,
    pub parent_goal_name: Option<String>,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub progress_percentage: u32,
    pub is_overdue: bool,
    pub days_until_due: Option<i64>,
}

/// Counts over a set of tasks
#[derive(Default)]
struct TaskTally {
    total: usize,
    completed: usize,
    overdue: usize,
    estimated: i64,
    completed_estimated: i64,
}

impl TaskTally {
    fn of<'a>(tasks: impl Iterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        tasks.fold(Self::default(), |mut tally, task| {
            let minutes = task.time_estimate_minutes.unwrap_or(0);
            tally.total += 1;
            tally.estimated += minutes;
            if task.status.is_done() {
                tally.completed += 1;
                tally.completed_estimated += minutes;
            }
            if is_overdue(task.due_date, task.status, now) {
                tally.overdue += 1;
            }
            tally
        })
    }
}

pub fn project_dashboard(store: &EntityStore, project: &Project, now: DateTime<Utc>) -> ProjectDashboard {
    let goals: Vec<&Goal> = store.goals_for_project(&project.id).collect();
    let completed_goals = goals.iter().filter(|g| g.status.is_done()).count();
    let tasks = TaskTally::of(store.tasks_for_project(&project.id), now);

    ProjectDashboard {
        project: project.clone(),
        total_goals: goals.len(),
        completed_goals,
        total_tasks: tasks.total,
        completed_tasks: tasks.completed,
        overdue_tasks: tasks.overdue,
        task_progress_percentage: percentage(tasks.completed, tasks.total),
        goal_progress_percentage: percentage(completed_goals, goals.len()),
        total_estimated_minutes: tasks.estimated,
        completed_estimated_minutes: tasks.completed_estimated,
    }
}

pub fn project_dashboards(store: &EntityStore, now: DateTime<Utc>) -> Vec<ProjectDashboard> {
    store
        .projects()
        .iter()
        .map(|p| project_dashboard(store, p, now))
        .collect()
}

pub fn goal_progress(store: &EntityStore, goal: &Goal, now: DateTime<Utc>) -> GoalProgress {
    let tasks = TaskTally::of(store.tasks_for_goal(&goal.id), now);

    GoalProgress {
        goal: goal.clone(),
        project_name: store
            .entity_name(EntityKind::Project, &goal.project_id)
            .unwrap_or_default()
            .to_string(),
        parent_goal_name: goal
            .parent_goal_id
            .as_deref()
            .and_then(|id| store.entity_name(EntityKind::Goal, id))
            .map(str::to_string),
        total_tasks: tasks.total,
        completed_tasks: tasks.completed,
        overdue_tasks: tasks.overdue,
        progress_percentage: percentage(tasks.completed, tasks.total),
        is_overdue: is_overdue(goal.due_date, goal.status, now),
        days_until_due: days_until_due(goal.due_date, now),
    }
}

pub fn goal_progress_all(store: &EntityStore, now: DateTime<Utc>) -> Vec<GoalProgress> {
    store
        .goals()
        .iter()
        .map(|g| goal_progress(store, g, now))
        .collect()
}
