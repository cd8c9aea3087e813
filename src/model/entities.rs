//! Core entities of the Event Horizon model
//!
//! - `Project`: top of the hierarchy
//! - `Goal`: belongs to a project, optionally nested under a parent goal
//! - `Task`: belongs to a goal
//! - `KnowledgeBase`: freestanding Markdown document referencing any of the above
//! - `KnowledgeReference` and `TaskDependency`: relation records
//!
//! Entities are built from create payloads and merged with update payloads by
//! the in-memory backend; the REST backend returns them fully formed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{ModelError, ModelResult};
use super::payloads::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, UpdateGoal, UpdateKnowledge,
    UpdateProject, UpdateTask,
};
use super::types::{
    EffortLevel, EntityKind, ExpansionHorizon, GoalScope, GoalStatus, MilestoneGranularity,
    Priority, ProjectStatus, TaskStatus, TaskType,
};

/// Common surface of every stored entity
pub trait Entity {
    /// Entity kind name used in logs and error messages
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn name(&self) -> &str;
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`, `...+00:00`) as well as naive
/// ISO 8601 datetimes without an offset, which are taken as UTC.
pub fn parse_timestamp(s: &str) -> ModelResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| ModelError::InvalidTimestamp(s.to_string()))
}

/// Parse a calendar date in `YYYY-MM-DD` form
pub fn parse_date(s: &str) -> ModelResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ModelError::InvalidDate(s.to_string()))
}

/// Serde adapter for entity timestamps
mod timestamp {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Treat a JSON `null` list as empty
fn nullable_vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

// ============================================
// PROJECT
// ============================================

/// A project: the root of a goal/task hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
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
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Project {
    const KIND: &'static str = "project";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Project {
    /// Build a project from a create payload
    pub fn from_create(id: impl Into<String>, payload: CreateProject, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: payload.name,
            description: payload.description,
            status: payload.status,
            start_date: payload.start_date,
            end_date: payload.end_date,
            is_active: payload.is_active,
            is_validated: payload.is_validated,
            time_estimate_months: payload.time_estimate_months,
            time_estimation_validated: payload.time_estimation_validated,
            expansion_horizon: payload.expansion_horizon,
            milestone_granularity: payload.milestone_granularity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the set fields of an update
    pub fn apply(&mut self, update: &UpdateProject, now: DateTime<Utc>) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.start_date.is_some() {
            self.start_date = update.start_date;
        }
        if update.end_date.is_some() {
            self.end_date = update.end_date;
        }
        if let Some(v) = update.is_active {
            self.is_active = v;
        }
        if let Some(v) = update.is_validated {
            self.is_validated = v;
        }
        if update.time_estimate_months.is_some() {
            self.time_estimate_months = update.time_estimate_months;
        }
        if let Some(v) = update.time_estimation_validated {
            self.time_estimation_validated = v;
        }
        if update.expansion_horizon.is_some() {
            self.expansion_horizon = update.expansion_horizon;
        }
        if update.milestone_granularity.is_some() {
            self.milestone_granularity = update.milestone_granularity;
        }
        self.updated_at = now;
    }
}

// ============================================
// GOAL
// ============================================

/// A goal within a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: String,
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
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Goal {
    const KIND: &'static str = "goal";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Goal {
    pub fn from_create(id: impl Into<String>, payload: CreateGoal, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: payload.name,
            description: payload.description,
            status: payload.status,
            scope: payload.scope,
            success_criteria: payload.success_criteria,
            due_date: payload.due_date,
            project_id: payload.project_id,
            parent_goal_id: payload.parent_goal_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &UpdateGoal, now: DateTime<Utc>) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if update.scope.is_some() {
            self.scope = update.scope;
        }
        if let Some(criteria) = &update.success_criteria {
            self.success_criteria = Some(criteria.clone());
        }
        if update.due_date.is_some() {
            self.due_date = update.due_date;
        }
        if let Some(parent) = &update.parent_goal_id {
            self.parent_goal_id = Some(parent.clone());
        }
        self.updated_at = now;
    }
}

// ============================================
// TASK
// ============================================

/// A task within a goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
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
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Task {
    const KIND: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Task {
    pub fn from_create(id: impl Into<String>, payload: CreateTask, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: payload.name,
            description: payload.description,
            status: payload.status,
            task_type: payload.task_type,
            priority: payload.priority,
            effort_level: payload.effort_level,
            time_estimate_minutes: payload.time_estimate_minutes,
            due_date: payload.due_date,
            date_completed: payload.date_completed,
            week_start_date: payload.week_start_date,
            assignee: payload.assignee,
            goal_id: payload.goal_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create payload carrying every user-editable field of this task
    pub fn to_create(&self) -> CreateTask {
        CreateTask {
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            task_type: self.task_type,
            priority: self.priority,
            effort_level: self.effort_level,
            time_estimate_minutes: self.time_estimate_minutes,
            due_date: self.due_date,
            date_completed: self.date_completed,
            week_start_date: self.week_start_date,
            assignee: self.assignee.clone(),
            goal_id: self.goal_id.clone(),
        }
    }

    /// Merge an update, applying the completion-date rule.
    ///
    /// Setting status `Done` without an explicit `date_completed` stamps
    /// `today`; setting any other status clears `date_completed`. An update
    /// that leaves status unset keeps the current completion date unless one
    /// is given explicitly.
    pub fn apply(&mut self, update: &UpdateTask, today: NaiveDate, now: DateTime<Utc>) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if update.task_type.is_some() {
            self.task_type = update.task_type;
        }
        if update.priority.is_some() {
            self.priority = update.priority;
        }
        if update.effort_level.is_some() {
            self.effort_level = update.effort_level;
        }
        if update.time_estimate_minutes.is_some() {
            self.time_estimate_minutes = update.time_estimate_minutes;
        }
        if update.due_date.is_some() {
            self.due_date = update.due_date;
        }
        if update.week_start_date.is_some() {
            self.week_start_date = update.week_start_date;
        }
        if let Some(assignee) = &update.assignee {
            self.assignee = Some(assignee.clone());
        }
        if let Some(goal_id) = &update.goal_id {
            self.goal_id = goal_id.clone();
        }

        match update.status {
            Some(status) => {
                self.status = status;
                self.date_completed = if status.is_done() {
                    update.date_completed.or(Some(today))
                } else {
                    None
                };
            }
            None => {
                if update.date_completed.is_some() {
                    self.date_completed = update.date_completed;
                }
            }
        }
        self.updated_at = now;
    }

    /// Change only the status, applying the completion-date rule
    pub fn set_status(&mut self, status: TaskStatus, today: NaiveDate, now: DateTime<Utc>) {
        self.apply(&UpdateTask::status(status), today, now);
    }
}

// ============================================
// KNOWLEDGE BASE
// ============================================

/// A Markdown knowledge base document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeBase {
    pub id: String,
    pub document_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub link_citations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_attachment: Option<String>,
    pub date_added: NaiveDate,
    /// Names of referenced entities, parallel to `related_entity_ids`
    #[serde(default, deserialize_with = "nullable_vec")]
    pub related_entities: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub related_entity_ids: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub entity_types: Vec<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for KnowledgeBase {
    const KIND: &'static str = "knowledge base item";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.document_name
    }
}

impl KnowledgeBase {
    pub fn from_create(id: impl Into<String>, payload: CreateKnowledge, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            document_name: payload.document_name,
            content: payload.content,
            ai_summary: payload.ai_summary,
            link_citations: payload.link_citations,
            file_attachment: None,
            date_added: now.date_naive(),
            related_entities: Vec::new(),
            related_entity_ids: Vec::new(),
            entity_types: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &UpdateKnowledge, now: DateTime<Utc>) {
        if let Some(name) = &update.document_name {
            self.document_name = name.clone();
        }
        if let Some(content) = &update.content {
            self.content = Some(content.clone());
        }
        if let Some(summary) = &update.ai_summary {
            self.ai_summary = Some(summary.clone());
        }
        if let Some(citations) = &update.link_citations {
            self.link_citations = citations.clone();
        }
        self.updated_at = now;
    }

    /// References carried on the wire as parallel id/type lists.
    ///
    /// Entries with an unknown entity type are skipped.
    pub fn references(&self) -> Vec<KnowledgeReference> {
        self.related_entity_ids
            .iter()
            .zip(self.entity_types.iter())
            .filter_map(|(entity_id, kind)| {
                kind.parse::<EntityKind>().ok().map(|entity_type| KnowledgeReference {
                    knowledge_base_id: self.id.clone(),
                    entity_type,
                    entity_id: entity_id.clone(),
                })
            })
            .collect()
    }
}

/// Typed link from a knowledge base document to a project, goal or task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct KnowledgeReference {
    pub knowledge_base_id: String,
    pub entity_type: EntityKind,
    pub entity_id: String,
}

/// `task_id` cannot start before `depends_on_task_id` is done
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDependency {
    pub id: String,
    pub task_id: String,
    pub depends_on_task_id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T10:00:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01T10:00:00.000").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01 10:00:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_task_deserializes_backend_shape() {
        let json = r#"{
            "id": "t-1",
            "name": "Write docs",
            "status": "Active",
            "task_type": "Develop",
            "priority": null,
            "time_estimate_minutes": 90,
            "due_date": "2024-06-01",
            "goal_id": "g-1",
            "goal_name": "Docs",
            "created_at": "2024-05-01T10:00:00.123456",
            "updated_at": "2024-05-01T10:00:00+00:00"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Active);
        assert_eq!(task.task_type, Some(TaskType::Develop));
        assert_eq!(task.priority, None);
        assert_eq!(task.time_estimate_minutes, Some(90));
        assert_eq!(task.due_date, Some(date(2024, 6, 1)));
    }

    #[test]
    fn test_task_completion_rule() {
        let mut task = Task::from_create("t-1", CreateTask::new("T1", "g-1"), at(2024, 5, 1));

        task.set_status(TaskStatus::Done, date(2024, 5, 3), at(2024, 5, 3));
        assert_eq!(task.date_completed, Some(date(2024, 5, 3)));

        // Editing another field keeps the completion date
        let rename = UpdateTask {
            name: Some("T1 renamed".into()),
            ..Default::default()
        };
        task.apply(&rename, date(2024, 5, 4), at(2024, 5, 4));
        assert_eq!(task.date_completed, Some(date(2024, 5, 3)));

        task.set_status(TaskStatus::Active, date(2024, 5, 5), at(2024, 5, 5));
        assert_eq!(task.date_completed, None);
        assert_eq!(task.updated_at, at(2024, 5, 5));
    }

    #[test]
    fn test_explicit_completion_date_wins() {
        let mut task = Task::from_create("t-1", CreateTask::new("T1", "g-1"), at(2024, 5, 1));
        let update = UpdateTask {
            status: Some(TaskStatus::Done),
            date_completed: Some(date(2024, 4, 30)),
            ..Default::default()
        };
        task.apply(&update, date(2024, 5, 3), at(2024, 5, 3));
        assert_eq!(task.date_completed, Some(date(2024, 4, 30)));
    }

    #[test]
    fn test_to_create_round_trip() {
        let payload = CreateTask::new("T1", "g-1")
            .status(TaskStatus::Done)
            .estimate(60)
            .classify(TaskType::Review, Priority::High, EffortLevel::Small)
            .due(date(2024, 6, 1));
        let task = Task::from_create("t-1", payload.clone(), at(2024, 5, 1));
        assert_eq!(task.to_create(), payload);
    }

    #[test]
    fn test_knowledge_references_from_wire_lists() {
        let json = r#"{
            "id": "kb-1",
            "document_name": "Notes",
            "link_citations": null,
            "date_added": "2024-05-01",
            "related_entities": ["Alpha", "G1"],
            "related_entity_ids": ["p-1", "g-1"],
            "entity_types": ["project", "goal"],
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        }"#;
        let kb: KnowledgeBase = serde_json::from_str(json).unwrap();
        assert!(kb.link_citations.is_empty());

        let refs = kb.references();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].entity_type, EntityKind::Project);
        assert_eq!(refs[1].entity_id, "g-1");
        assert!(refs.iter().all(|r| r.knowledge_base_id == "kb-1"));
    }
}
