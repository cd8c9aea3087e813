//! Event Horizon Backend Access
//!
//! All data flows through the [`Backend`] trait.
//!
//! # Implementations
//!
//! - [`HttpBackend`]: REST client for the Event Horizon service
//! - [`MemoryBackend`]: in-process store with the service's rules, used by
//!   the mock server and in tests
//!
//! # REST contract
//!
//! ## Projects
//! - `GET|POST /projects/`, `GET|PUT|DELETE /projects/{id}`
//! - `GET /projects/{id}/goals`
//!
//! ## Goals
//! - `GET|POST /goals/`, `GET|PUT|DELETE /goals/{id}`
//! - `GET /goals/{id}/tasks`
//!
//! ## Tasks
//! - `GET|POST /tasks/`, `GET|PUT|DELETE /tasks/{id}`
//! - `GET /tasks/goal/{id}`, `PATCH /tasks/{id}/status`
//!
//! ## Knowledge base
//! - `GET|POST /knowledge/`, `GET|PUT|DELETE /knowledge/{id}`
//! - `GET /knowledge/{project|goal|task}/{id}`
//! - `POST /knowledge/{id}/references`, `DELETE /knowledge/{id}/references/{kind}/{entity_id}`
//! - `POST /knowledge/{id}/upload`, `GET /knowledge/{id}/download`, `DELETE /knowledge/{id}/attachment`
//!
//! ## Task dependencies
//! - `GET|POST /task-dependencies/`, `DELETE /task-dependencies/{task_id}/{depends_on_task_id}`
//!
//! # Example
//!
//! ```rust,ignore
//! use event_horizon::api::{Backend, HttpBackend, DEFAULT_TIMEOUT};
//!
//! let api = HttpBackend::new("http://localhost:8000/api", DEFAULT_TIMEOUT)?;
//! for project in api.list_projects().await? {
//!     println!("{}", project.name);
//! }
//! ```

mod backend;
mod client;
mod error;
mod memory;

pub use backend::{Attachment, Backend, DeleteResponse, UploadResponse};
pub use client::{HttpBackend, DEFAULT_TIMEOUT};
pub use error::{ClientError, ClientResult};
pub use memory::MemoryBackend;
