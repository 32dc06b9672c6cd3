//! String length constraints, counted in characters

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use serde_json::Value;

/// Bounds on the character count of a string. Null passes; non-strings fail.
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    /// Minimum length, inclusive
    pub min: Option<usize>,
    /// Maximum length, inclusive
    pub max: Option<usize>,
    /// Custom error message
    pub message: Option<String>,
}

impl LengthValidator {
    /// Unbounded; add limits with the builder methods
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum length
    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    /// Set maximum length
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Set both bounds
    pub fn range(self, min: usize, max: usize) -> Self {
        self.min(min).max(max)
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn error_message(&self, field: &str) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                format!("{} must be between {} and {} characters long", field, min, max)
            }
            (Some(min), None) => format!("{} must be at least {} characters long", field, min),
            (None, Some(max)) => format!("{} must be at most {} characters long", field, max),
            (None, None) => format!("{} has an invalid length", field),
        }
    }
}

#[async_trait]
impl ValidationRule for LengthValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        let length = match value {
            Value::Null => return Ok(()),
            Value::String(s) => s.chars().count(),
            _ => {
                return Err(ValidationError::with_code(
                    field,
                    format!("{} must be a string", field),
                    "invalid_type",
                )
                .into())
            }
        };

        if let Some(min) = self.min {
            if length < min {
                return Err(
                    ValidationError::with_code(field, self.error_message(field), "length_min").into(),
                );
            }
        }
        if let Some(max) = self.max {
            if length > max {
                return Err(
                    ValidationError::with_code(field, self.error_message(field), "length_max").into(),
                );
            }
        }
        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_bounds_are_inclusive() {
        let validator = LengthValidator::new().range(2, 4);
        assert!(validator.validate(&json!("ab"), "name").await.is_ok());
        assert!(validator.validate(&json!("abcd"), "name").await.is_ok());
        assert!(validator.validate(&json!("a"), "name").await.is_err());
        assert!(validator.validate(&json!("abcde"), "name").await.is_err());
    }

    #[tokio::test]
    async fn test_counts_characters_not_bytes() {
        let validator = LengthValidator::new().max(5);
        assert!(validator.validate(&json!("Hà Nội"), "city").await.is_err());
        assert!(validator.validate(&json!("Huế"), "city").await.is_ok());
    }

    #[tokio::test]
    async fn test_null_is_skipped_and_numbers_rejected() {
        let validator = LengthValidator::new().min(5);
        assert!(validator.validate(&json!(null), "street").await.is_ok());
        let errors = validator.validate(&json!(12345), "pincode").await.unwrap_err();
        assert_eq!(errors.errors["pincode"][0].code, "invalid_type");
    }
}
