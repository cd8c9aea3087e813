//! Client Error Types
//!
//! Errors surfaced by [`Backend`](super::Backend) implementations. Missing
//! resources are not errors: get/update return `Ok(None)` and delete returns
//! `Ok(false)`.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Backend client error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// Payload rejected before it reached the network
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Non-success HTTP status with the server's parsed detail
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    /// Backend refused the connection
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Bad request with a plain detail message
    pub fn bad_request(detail: impl Into<String>) -> Self {
        ClientError::Api {
            status: 400,
            detail: detail.into(),
        }
    }

    /// Map a reqwest failure the same way for every call site
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Unavailable
        } else {
            ClientError::Network(err)
        }
    }

    /// Message suitable for a user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(errors) => errors.to_string(),
            ClientError::Api { detail, .. } => detail.clone(),
            ClientError::Unavailable | ClientError::Network(_) => {
                "Unable to reach the server. Please try again.".to_string()
            }
            ClientError::Timeout => "The server took too long to respond.".to_string(),
            ClientError::Decode(_) => "Unexpected response from the server.".to_string(),
        }
    }
}

/// Result type for backend operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldError;

    #[test]
    fn test_user_messages() {
        let err = ClientError::Api {
            status: 422,
            detail: "name: field required".to_string(),
        };
        assert_eq!(err.user_message(), "name: field required");
        assert_eq!(err.to_string(), "API error 422: name: field required");

        let err = ClientError::from(ValidationErrors::from(FieldError::new("name", "is required")));
        assert_eq!(err.user_message(), "name: is required");

        assert!(ClientError::Unavailable.user_message().contains("reach the server"));
    }
}
