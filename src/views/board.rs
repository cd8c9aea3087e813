//! Task board: filtered, sorted and grouped task details

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use super::details::{task_details, TaskDetails};
use crate::model::{GoalScope, ModelError, Task, WorkStatus};
use crate::store::EntityStore;

/// Column order of the board
pub const BOARD_ORDER: [WorkStatus; 4] = [
    WorkStatus::Active,
    WorkStatus::NotStarted,
    WorkStatus::Done,
    WorkStatus::Cancelled,
];

/// Which tasks the board shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    /// Every task
    #[default]
    All,
    /// Tasks of projects flagged active
    ActiveProjects,
    /// Tasks of goals with status Active
    ActiveGoals,
    /// Tasks of active Weekly-Milestone goals
    ActiveMilestones,
}

impl TaskFilter {
    const NAMES: [(TaskFilter, &'static str); 4] = [
        (TaskFilter::All, "all"),
        (TaskFilter::ActiveProjects, "projects"),
        (TaskFilter::ActiveGoals, "goals"),
        (TaskFilter::ActiveMilestones, "milestones"),
    ];

    pub fn as_str(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(f, _)| *f == self)
            .map_or("all", |(_, name)| *name)
    }

    fn matches(self, store: &EntityStore, task: &Task) -> bool {
        let goal = store.goal(&task.goal_id);
        match self {
            TaskFilter::All => true,
            TaskFilter::ActiveProjects => goal
                .and_then(|g| store.project(&g.project_id))
                .map_or(false, |p| p.is_active),
            TaskFilter::ActiveGoals => goal.map_or(false, |g| g.status == WorkStatus::Active),
            TaskFilter::ActiveMilestones => goal.map_or(false, |g| {
                g.status == WorkStatus::Active && g.scope == Some(GoalScope::WeeklyMilestone)
            }),
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(trimmed))
            .map(|(filter, _)| *filter)
            .ok_or_else(|| ModelError::UnknownVariant {
                kind: "task filter",
                value: s.to_string(),
                expected: "all, projects, goals, milestones".to_string(),
            })
    }
}

/// Board ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    /// Board column order, newest first within a column
    #[default]
    Status,
    /// Creation time, newest first
    Newest,
}

impl FromStr for TaskSort {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(TaskSort::Status),
            "newest" => Ok(TaskSort::Newest),
            _ => Err(ModelError::UnknownVariant {
                kind: "task sort",
                value: s.to_string(),
                expected: "status, newest".to_string(),
            }),
        }
    }
}

/// One board column
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusColumn {
    pub status: WorkStatus,
    pub tasks: Vec<TaskDetails>,
}

fn board_rank(status: WorkStatus) -> usize {
    BOARD_ORDER
        .iter()
        .position(|s| *s == status)
        .unwrap_or(BOARD_ORDER.len())
}

/// Task details matching `filter`, in `sort` order
pub fn task_board(
    store: &EntityStore,
    filter: TaskFilter,
    sort: TaskSort,
    now: DateTime<Utc>,
) -> Vec<TaskDetails> {
    let mut details: Vec<TaskDetails> = store
        .tasks()
        .iter()
        .filter(|t| filter.matches(store, t))
        .map(|t| task_details(store, t, now))
        .collect();

    match sort {
        TaskSort::Status => {
            details.sort_by_key(|d| (board_rank(d.task.status), Reverse(d.task.created_at)))
        }
        TaskSort::Newest => details.sort_by_key(|d| Reverse(d.task.created_at)),
    }
    details
}

/// Split details into board columns; every column is present, possibly empty
pub fn group_by_status(details: Vec<TaskDetails>) -> Vec<StatusColumn> {
    let mut columns: Vec<StatusColumn> = BOARD_ORDER
        .iter()
        .map(|status| StatusColumn {
            status: *status,
            tasks: Vec::new(),
        })
        .collect();
    for detail in details {
        columns[board_rank(detail.task.status)].tasks.push(detail);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateGoal, CreateProject, CreateTask, Goal, Project};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn store() -> EntityStore {
        let mut store = EntityStore::new();
        store.upsert_project(Project::from_create(
            "p-live",
            CreateProject::new("Live").active(true),
            now(),
        ));
        store.upsert_project(Project::from_create("p-idle", CreateProject::new("Idle"), now()));
        store.upsert_goal(Goal::from_create(
            "g-month",
            CreateGoal::new("Month", "p-live")
                .scope(GoalScope::Monthly)
                .status(WorkStatus::Active),
            now(),
        ));
        store.upsert_goal(Goal::from_create(
            "g-week",
            CreateGoal::new("Week", "p-live")
                .scope(GoalScope::WeeklyMilestone)
                .parent("g-month")
                .status(WorkStatus::Active),
            now(),
        ));
        store.upsert_goal(Goal::from_create("g-idle", CreateGoal::new("Idle", "p-idle"), now()));

        let tasks = [
            ("t1", "g-month", WorkStatus::Done),
            ("t2", "g-week", WorkStatus::NotStarted),
            ("t3", "g-idle", WorkStatus::Active),
            ("t4", "g-week", WorkStatus::Active),
            ("t5", "g-month", WorkStatus::Cancelled),
        ];
        for (offset, (id, goal, status)) in tasks.into_iter().enumerate() {
            let created = now() + Duration::minutes(offset as i64);
            store.upsert_task(Task::from_create(
                id,
                CreateTask::new(id, goal).status(status),
                created,
            ));
        }
        store
    }

    fn ids(details: &[TaskDetails]) -> Vec<&str> {
        details.iter().map(|d| d.task.id.as_str()).collect()
    }

    #[test]
    fn test_filters() {
        let store = store();
        let board = |filter| task_board(&store, filter, TaskSort::Newest, now());

        assert_eq!(ids(&board(TaskFilter::All)), vec!["t5", "t4", "t3", "t2", "t1"]);
        assert_eq!(ids(&board(TaskFilter::ActiveProjects)), vec!["t5", "t4", "t2", "t1"]);
        assert_eq!(ids(&board(TaskFilter::ActiveGoals)), vec!["t5", "t4", "t2", "t1"]);
        assert_eq!(ids(&board(TaskFilter::ActiveMilestones)), vec!["t4", "t2"]);
    }

    #[test]
    fn test_status_sort_then_newest() {
        let store = store();
        let board = task_board(&store, TaskFilter::All, TaskSort::Status, now());
        assert_eq!(ids(&board), vec!["t4", "t3", "t2", "t1", "t5"]);
    }

    #[test]
    fn test_group_by_status() {
        let store = store();
        let board = task_board(&store, TaskFilter::ActiveMilestones, TaskSort::Status, now());
        let columns = group_by_status(board);

        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].status, WorkStatus::Active);
        assert_eq!(ids(&columns[0].tasks), vec!["t4"]);
        assert_eq!(ids(&columns[1].tasks), vec!["t2"]);
        assert!(columns[2].tasks.is_empty());
        assert!(columns[3].tasks.is_empty());
    }

    #[test]
    fn test_parse_filter_and_sort() {
        assert_eq!("Milestones".parse::<TaskFilter>().unwrap(), TaskFilter::ActiveMilestones);
        assert_eq!("newest".parse::<TaskSort>().unwrap(), TaskSort::Newest);
        assert!("dependency".parse::<TaskSort>().is_err());
        assert_eq!(TaskFilter::ActiveGoals.to_string(), "goals");
    }
}
