//! Model error types
//!
//! Errors raised while parsing or converting domain values.

use thiserror::Error;

/// Errors that can occur in the domain model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A string did not match any known variant of a wire enum
    #[error("Unknown {kind} '{value}'. Expected one of: {expected}")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: String,
    },

    /// Timestamp could not be parsed as RFC 3339 or a naive ISO 8601 datetime
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Date could not be parsed as YYYY-MM-DD
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::UnknownVariant {
            kind: "task status",
            value: "Paused".to_string(),
            expected: "Not started, Active, Done, Cancelled".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown task status 'Paused'. Expected one of: Not started, Active, Done, Cancelled"
        );

        let err = ModelError::InvalidDate("31/12/2024".to_string());
        assert_eq!(err.to_string(), "Invalid date '31/12/2024', expected YYYY-MM-DD");
    }
}
