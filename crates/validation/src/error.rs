//! Validation error types

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result of running one rule or a whole rule set
pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// One failed check on one field
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationError {
    /// Field the error belongs to
    pub field: String,
    /// Human-readable message
    pub message: String,
    /// Machine-readable rule code (`required`, `length_min`, ...)
    pub code: String,
}

impl ValidationError {
    /// Error with the generic `validation_failed` code
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_code(field, message, "validation_failed")
    }

    /// Error with a specific rule code
    pub fn with_code(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Failures grouped by field, in field-name order
#[derive(Debug, Clone, Default, Serialize, PartialEq, Error)]
pub struct ValidationErrors {
    /// Errors keyed by field name
    pub errors: BTreeMap<String, Vec<ValidationError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error under its field
    pub fn add(&mut self, error: ValidationError) {
        self.errors.entry(error.field.clone()).or_default().push(error);
    }

    /// Add a message under `field` with the generic code
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.add(ValidationError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether `field` has at least one error
    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.get(field).is_some_and(|errors| !errors.is_empty())
    }

    /// Move every error from `other` into this collection
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
    }

    /// Messages only, the shape of the `errors` member of an error response
    pub fn field_messages(&self) -> BTreeMap<String, Vec<String>> {
        self.errors
            .iter()
            .map(|(field, errors)| {
                (
                    field.clone(),
                    errors.iter().map(|error| error.message.clone()).collect(),
                )
            })
            .collect()
    }

    /// First message overall, used as the summary line of a response
    pub fn first_message(&self) -> Option<&str> {
        self.errors
            .values()
            .flat_map(|errors| errors.iter())
            .map(|error| error.message.as_str())
            .next()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "No validation errors");
        }
        write!(f, "Validation failed for {} field(s):", self.errors.len())?;
        for (field, errors) in &self.errors {
            for error in errors {
                write!(f, "\n  {}: {}", field, error.message)?;
            }
        }
        Ok(())
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(error);
        errors
    }
}
