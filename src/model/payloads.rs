//! Create and update payloads
//!
//! Create payloads carry every user-editable field of an entity; update
//! payloads carry only the fields being changed (unset fields are omitted from
//! the JSON body). Builders follow the same shape as the entities they create.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{
    EffortLevel, EntityKind, ExpansionHorizon, GoalScope, GoalStatus, MilestoneGranularity,
    Priority, ProjectStatus, TaskStatus, TaskType,
};

// ============================================
// PROJECT
// ============================================

/// Fields for creating a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreateProject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate_months: Option<i64>,
    #[serde(default)]
    pub time_estimation_validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion_horizon: Option<ExpansionHorizon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_granularity: Option<MilestoneGranularity>,
}

impl CreateProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: set the planned date range
    pub fn dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn estimate_months(mut self, months: i64) -> Self {
        self.time_estimate_months = Some(months);
        self
    }
}

/// Changed fields of a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateProject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_validated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate_months: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimation_validated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion_horizon: Option<ExpansionHorizon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone_granularity: Option<MilestoneGranularity>,
}

// ============================================
// GOAL
// ============================================

/// Fields for creating a goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreateGoal {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<GoalScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_goal_id: Option<String>,
}

impl CreateGoal {
    pub fn new(name: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    pub fn scope(mut self, scope: GoalScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn parent(mut self, parent_goal_id: impl Into<String>) -> Self {
        self.parent_goal_id = Some(parent_goal_id.into());
        self
    }

    pub fn status(mut self, status: GoalStatus) -> Self {
        self.status = status;
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Changed fields of a goal
///
/// A goal cannot be moved to another project; `project_id` is not updatable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateGoal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GoalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<GoalScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_goal_id: Option<String>,
}

// ============================================
// TASK
// ============================================

/// Fields for creating a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreateTask {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_level: Option<EffortLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub goal_id: String,
}

impl CreateTask {
    pub fn new(name: impl Into<String>, goal_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goal_id: goal_id.into(),
            ..Default::default()
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: set the time estimate in minutes
    pub fn estimate(mut self, minutes: i64) -> Self {
        self.time_estimate_minutes = Some(minutes);
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Builder: set type, priority and effort in one go
    pub fn classify(mut self, task_type: TaskType, priority: Priority, effort: EffortLevel) -> Self {
        self.task_type = Some(task_type);
        self.priority = Some(priority);
        self.effort_level = Some(effort);
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }
}

/// Changed fields of a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_level: Option<EffortLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_completed: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
}

impl UpdateTask {
    /// Update that only changes the status
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Body of `PATCH /tasks/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPatch {
    pub status: TaskStatus,
}

// ============================================
// KNOWLEDGE BASE
// ============================================

/// Fields for creating a knowledge base document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreateKnowledge {
    pub document_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub link_citations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_projects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_tasks: Vec<String>,
}

impl CreateKnowledge {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            ..Default::default()
        }
    }

    /// Builder: set the Markdown body
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.ai_summary = Some(summary.into());
        self
    }

    pub fn citation(mut self, url: impl Into<String>) -> Self {
        self.link_citations.push(url.into());
        self
    }

    /// Builder: reference a project, goal or task
    pub fn relate(mut self, kind: EntityKind, entity_id: impl Into<String>) -> Self {
        let id = entity_id.into();
        match kind {
            EntityKind::Project => self.related_projects.push(id),
            EntityKind::Goal => self.related_goals.push(id),
            EntityKind::Task => self.related_tasks.push(id),
        }
        self
    }

    /// All related entities as (kind, id) pairs
    pub fn relations(&self) -> impl Iterator<Item = (EntityKind, &str)> + '_ {
        self.related_projects
            .iter()
            .map(|id| (EntityKind::Project, id.as_str()))
            .chain(self.related_goals.iter().map(|id| (EntityKind::Goal, id.as_str())))
            .chain(self.related_tasks.iter().map(|id| (EntityKind::Task, id.as_str())))
    }
}

/// Changed fields of a knowledge base document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateKnowledge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_citations: Option<Vec<String>>,
}

/// Body of `POST /knowledge/{id}/references`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRequest {
    pub entity_type: EntityKind,
    pub entity_id: String,
}

/// Body of `POST /task-dependencies/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyRequest {
    pub task_id: String,
    pub depends_on_task_id: String,
}
