//! Mock Server Error Types
//!
//! Errors are rendered the way the real service renders them: a JSON body
//! with a `detail` string, or for payload validation a `detail` list of
//! `{loc, msg, type}` entries with status 422.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::api::ClientError;

/// Mock server error types
#[derive(Error, Debug)]
pub enum MockServerError {
    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Malformed request the backend never saw
    #[error("{0}")]
    BadRequest(String),

    /// Error raised by the in-memory backend
    #[error(transparent)]
    Backend(#[from] ClientError),

    /// Socket or listener failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MockServerError {
    pub fn not_found(kind: &str) -> Self {
        MockServerError::NotFound(format!("{} not found", kind))
    }
}

#[derive(Serialize)]
struct DetailBody<T: Serialize> {
    detail: T,
}

#[derive(Serialize)]
struct FieldDetail {
    loc: [String; 2],
    msg: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl IntoResponse for MockServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            MockServerError::Backend(ClientError::Validation(errors)) => {
                let detail: Vec<FieldDetail> = errors
                    .errors()
                    .iter()
                    .map(|e| FieldDetail {
                        loc: ["body".to_string(), e.field.clone()],
                        msg: e.message.clone(),
                        kind: "value_error",
                    })
                    .collect();
                tracing::debug!(errors = detail.len(), "Rejected invalid payload");
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(DetailBody { detail })).into_response();
            }
            MockServerError::Backend(ClientError::Api { status, detail }) => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
                detail,
            ),
            MockServerError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            MockServerError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            other => {
                tracing::error!(error = %other, "Mock server error");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        (status, Json(DetailBody { detail: message })).into_response()
    }
}

/// Result type for mock server handlers
pub type MockResult<T> = Result<T, MockServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FieldError, ValidationErrors};

    #[test]
    fn test_status_mapping() {
        let response = MockServerError::not_found("Project").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let errors = ValidationErrors::from(FieldError::new("name", "is required"));
        let response = MockServerError::from(ClientError::from(errors)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response =
            MockServerError::from(ClientError::bad_request("Invalid attachment filename")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
