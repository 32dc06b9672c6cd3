//! Numeric range constraints

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use serde_json::Value;

/// Accepts JSON numbers and numeric strings
#[derive(Debug, Clone, Default)]
pub struct NumericValidator {
    /// Minimum value, inclusive
    pub min: Option<f64>,
    /// Maximum value, inclusive
    pub max: Option<f64>,
    /// Strictly greater than zero
    pub positive_only: bool,
    /// Reject values with a fractional part
    pub integer_only: bool,
    pub message: Option<String>,
}

impl NumericValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum value
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set maximum value
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Set both bounds
    pub fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub fn positive_only(mut self) -> Self {
        self.positive_only = true;
        self
    }

    pub fn integer_only(mut self) -> Self {
        self.integer_only = true;
        self
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Numbers, or strings that parse to a finite number
    fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    fn fail(&self, field: &str, default: String, code: &str) -> ValidationResult<()> {
        let message = self.message.clone().unwrap_or(default);
        Err(ValidationError::with_code(field, message, code).into())
    }
}

#[async_trait]
impl ValidationRule for NumericValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        if value.is_null() {
            return Ok(());
        }

        let Some(number) = Self::as_number(value) else {
            return self.fail(field, format!("{} must be a number", field), "numeric");
        };

        if self.integer_only && number.fract() != 0.0 {
            return self.fail(field, format!("{} must be an integer", field), "integer");
        }
        if self.positive_only && number <= 0.0 {
            return self.fail(field, format!("{} must be greater than 0", field), "positive");
        }
        if let Some(min) = self.min {
            if number < min {
                return self.fail(field, format!("{} must be at least {}", field, min), "min");
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return self.fail(field, format!("{} must not be greater than {}", field, max), "max");
            }
        }
        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "numeric"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_reading_age_range() {
        let validator = NumericValidator::new().integer_only().range(0.0, 120.0);
        assert!(validator.validate(&json!(12), "readingAge").await.is_ok());
        assert!(validator.validate(&json!("7"), "readingAge").await.is_ok());
        assert!(validator.validate(&json!(121), "readingAge").await.is_err());
        assert!(validator.validate(&json!(-1), "readingAge").await.is_err());
        assert!(validator.validate(&json!(7.5), "readingAge").await.is_err());
    }

    #[tokio::test]
    async fn test_positive_price() {
        let validator = NumericValidator::new().positive_only();
        assert!(validator.validate(&json!(0.01), "price").await.is_ok());
        let errors = validator.validate(&json!(0), "price").await.unwrap_err();
        assert_eq!(errors.errors["price"][0].code, "positive");
    }

    #[tokio::test]
    async fn test_rejects_non_numbers() {
        let validator = NumericValidator::new();
        assert!(validator.validate(&json!("cheap"), "maxPrice").await.is_err());
        assert!(validator.validate(&json!(true), "maxPrice").await.is_err());
        assert!(validator.validate(&json!(null), "maxPrice").await.is_ok());
    }
}
