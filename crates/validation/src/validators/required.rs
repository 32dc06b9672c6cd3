//! Required field validator

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use serde_json::Value;

/// Fails on null, blank strings, and empty arrays or objects
#[derive(Debug, Clone, Default)]
pub struct RequiredValidator {
    /// Replaces the default `<field> is required`
    pub message: Option<String>,
}

impl RequiredValidator {
    /// Required validator with the default message
    pub fn new() -> Self {
        Self { message: None }
    }

    /// Required validator with a custom message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Null, whitespace-only strings, and empty arrays or objects
    fn is_empty(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(arr) => arr.is_empty(),
            Value::Object(obj) => obj.is_empty(),
            _ => false,
        }
    }
}

#[async_trait]
impl ValidationRule for RequiredValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        if Self::is_empty(value) {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} is required", field));
            return Err(ValidationError::with_code(field, message, "required").into());
        }
        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "required"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_values_fail() {
        let validator = RequiredValidator::new();
        for value in [json!(null), json!("  "), json!([]), json!({})] {
            assert!(validator.validate(&value, "title").await.is_err());
        }
    }

    #[tokio::test]
    async fn test_zero_and_false_are_present() {
        let validator = RequiredValidator::new();
        assert!(validator.validate(&json!(0), "quantity").await.is_ok());
        assert!(validator.validate(&json!(false), "flag").await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_message() {
        let validator = RequiredValidator::with_message("Please pick an address");
        let errors = validator.validate(&json!(null), "addressId").await.unwrap_err();
        assert_eq!(errors.field_messages()["addressId"], vec!["Please pick an address"]);
    }
}
