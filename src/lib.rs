//! # Event Horizon
//!
//! Project planning client: projects break down into goals, goals into tasks,
//! and a Markdown knowledge base links back to all three.
//!
//! ## Features
//!
//! - **Typed model**: Wire-compatible entities, payload builders and enums
//! - **Validation**: Every form is checked locally before a request is sent
//! - **Observable store**: In-memory cache with cascading deletes and change events
//! - **Derived views**: Dashboards, goal progress, task details, knowledge references
//! - **Backends**: REST client over reqwest, in-memory backend and an axum mock server
//! - **Planning assistant**: Webhook-driven chat sessions
//!
//! ## Modules
//!
//! - [`model`]: Entities, payloads and enums
//! - [`validation`]: Create/update schemas and server error parsing
//! - [`store`]: Entity cache with change notifications
//! - [`views`]: Aggregates computed from the store
//! - [`api`]: Backend trait, HTTP and in-memory implementations
//! - [`app`]: Application controller with notifications
//! - [`chat`]: Planning assistant session
//! - [`mock_server`]: REST server over the in-memory backend
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use event_horizon::api::HttpBackend;
//! use event_horizon::model::{CreateGoal, CreateProject, CreateTask, GoalScope, WorkStatus};
//! use event_horizon::EventHorizon;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = HttpBackend::new("http://localhost:8000/api", std::time::Duration::from_secs(30))?;
//!     let mut app = EventHorizon::new(backend);
//!     app.load_all().await;
//!
//!     let project = app.create_project(CreateProject::new("Alpha")).await?;
//!     let goal = app
//!         .create_goal(CreateGoal::new("G1", &project.id).scope(GoalScope::Monthly))
//!         .await?;
//!     let task = app.create_task(CreateTask::new("T1", &goal.id).estimate(60)).await?;
//!     app.set_task_status(&task.id, WorkStatus::Done).await?;
//!
//!     for dashboard in app.dashboards(chrono::Utc::now()) {
//!         println!("{}: {}%", dashboard.project.name, dashboard.task_progress_percentage);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod mock_server;
pub mod model;
pub mod store;
pub mod validation;
pub mod views;

// Re-export top-level types for convenience
pub use api::{Backend, ClientError, ClientResult, HttpBackend, MemoryBackend};

pub use app::{BulkUploadReport, EventHorizon, LoadReport, Notification, NotificationKind, UploadFile};

pub use chat::{ChatError, ChatSession, WebhookClient};

pub use config::{Config, ConfigError, LoggingConfig};

pub use store::{EntityStore, StoreEvent};

pub use validation::{FieldError, ValidationErrors};
