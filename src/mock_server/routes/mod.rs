//! Mock Server Routes
//!
//! Route handlers organized by resource.

pub mod dependencies;
pub mod goals;
pub mod health;
pub mod knowledge;
pub mod projects;
pub mod tasks;

use axum::Json;

use crate::api::DeleteResponse;
use crate::mock_server::error::{MockResult, MockServerError};

/// Standard delete response, or 404 when nothing was removed
fn deleted(removed: bool, kind: &str) -> MockResult<Json<DeleteResponse>> {
    if removed {
        Ok(Json(DeleteResponse {
            message: format!("{} deleted successfully", kind),
        }))
    } else {
        Err(MockServerError::not_found(kind))
    }
}
