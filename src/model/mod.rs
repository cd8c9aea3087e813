//! Event Horizon Domain Model
//!
//! This module provides the typed entities exchanged with the backend:
//!
//! - **types**: Wire enums (statuses, scopes, task classification)
//! - **entities**: Project, Goal, Task, KnowledgeBase and relation records
//! - **payloads**: Create/update request bodies with builders
//! - **error**: Model error types
//!
//! # Hierarchy
//!
//! ```text
//! Project ─┬─ Goal (Monthly/Quarterly) ─┬─ Goal (Weekly-Milestone)
//!          │                            └─ Task
//!          └─ Goal ── Task
//!
//! KnowledgeBase ──references──> Project | Goal | Task
//! ```

pub mod entities;
pub mod error;
pub mod payloads;
pub mod types;

pub use entities::{
    parse_date, parse_timestamp, Entity, Goal, KnowledgeBase, KnowledgeReference, Project, Task,
    TaskDependency,
};
pub use error::{ModelError, ModelResult};
pub use payloads::{
    CreateGoal, CreateKnowledge, CreateProject, CreateTask, DependencyRequest, ReferenceRequest,
    StatusPatch, UpdateGoal, UpdateKnowledge, UpdateProject, UpdateTask,
};
pub use types::{
    EffortLevel, EntityKind, ExpansionHorizon, GoalScope, GoalStatus, MilestoneGranularity,
    Priority, ProjectStatus, TaskStatus, TaskType, WorkStatus,
};
