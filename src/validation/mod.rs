//! Form Validation
//!
//! Declarative checks run on every payload before it is sent to the backend.
//! A payload that fails validation never reaches the network.
//!
//! ```text
//! payload ─> schema (field rules + store lookups) ─> Ok(()) ─> Backend
//!                                                 └> ValidationErrors
//! ```
//!
//! Server-side errors use the same `{field, message}` vocabulary; see
//! [`parse_server_detail`].

mod detail;
mod schemas;

pub use detail::parse_server_detail;
pub use schemas::{
    validate_create_goal, validate_create_knowledge, validate_create_project,
    validate_create_task, validate_dependency, validate_reference, validate_update_goal,
    validate_update_knowledge, validate_update_project, validate_update_task,
};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of entity and document names
pub const NAME_MAX_LEN: usize = 255;

/// One failed rule on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field errors found in one payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", join_errors(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors reported for one field
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self { errors: vec![error] }
    }
}

/// Result of validating a payload
pub type ValidationResult = Result<(), ValidationErrors>;

/// Accumulates field errors across a schema's rules
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error when `ok` is false
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Required name: 1 to [`NAME_MAX_LEN`] characters after trimming
    pub fn name(&mut self, field: &str, value: &str) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 {
            self.errors.push(FieldError::new(field, "is required"));
        } else if len > NAME_MAX_LEN {
            self.errors.push(FieldError::new(
                field,
                format!("must be at most {} characters", NAME_MAX_LEN),
            ));
        }
        self
    }

    /// Optional name: validated like [`Validator::name`] only when present
    pub fn optional_name(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => self.name(field, v),
            None => self,
        }
    }

    /// Optional number that must be strictly positive when present
    pub fn positive(&mut self, field: &str, value: Option<i64>) -> &mut Self {
        self.check(value.map_or(true, |v| v > 0), field, "must be greater than 0")
    }

    /// Required identifier
    pub fn required_id(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "is required")
    }

    pub fn push(&mut self, error: FieldError) -> &mut Self {
        self.errors.push(error);
        self
    }

    pub fn finish(&mut self) -> ValidationResult {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }
}

/// Parse a form value into an enum, reporting failures against `field`
pub fn parse_field<T>(field: &str, raw: &str) -> Result<T, FieldError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|e| FieldError::new(field, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GoalScope, WorkStatus};

    #[test]
    fn test_validator_collects_all_errors() {
        let err = Validator::new()
            .name("name", "   ")
            .positive("time_estimate_minutes", Some(0))
            .positive("time_estimate_months", None)
            .finish()
            .unwrap_err();

        assert_eq!(err.errors().len(), 2);
        assert!(err.has_field("name"));
        assert!(err.has_field("time_estimate_minutes"));
        assert_eq!(
            err.to_string(),
            "name: is required, time_estimate_minutes: must be greater than 0"
        );
    }

    #[test]
    fn test_name_length_counts_characters() {
        let at_limit = "é".repeat(NAME_MAX_LEN);
        assert!(Validator::new().name("name", &at_limit).finish().is_ok());

        let over = "x".repeat(NAME_MAX_LEN + 1);
        let err = Validator::new().name("name", &over).finish().unwrap_err();
        assert!(err.to_string().contains("at most 255"));
    }

    #[test]
    fn test_parse_field() {
        let status: WorkStatus = parse_field("status", "done").unwrap();
        assert_eq!(status, WorkStatus::Done);

        let err = parse_field::<GoalScope>("scope", "Yearly").unwrap_err();
        assert_eq!(err.field, "scope");
        assert!(err.message.contains("Weekly-Milestone"));
    }
}
