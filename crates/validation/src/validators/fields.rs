//! Cross-field rules, run against the whole request body

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use serde_json::Value;

/// `field` must equal `field_confirmation`
#[derive(Debug, Clone)]
pub struct ConfirmedValidator {
    /// The confirmed field; its partner is `<field>_confirmation`
    pub field: String,
}

impl ConfirmedValidator {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

#[async_trait]
impl ValidationRule for ConfirmedValidator {
    async fn validate(&self, data: &Value, _field: &str) -> ValidationResult<()> {
        let value = data.get(&self.field).unwrap_or(&Value::Null);
        if value.is_null() {
            return Ok(());
        }

        let confirmation_key = format!("{}_confirmation", self.field);
        if data.get(&confirmation_key) == Some(value) {
            Ok(())
        } else {
            Err(ValidationError::with_code(
                self.field.as_str(),
                format!("{} confirmation does not match", self.field),
                "confirmed",
            )
            .into())
        }
    }

    fn rule_name(&self) -> &'static str {
        "confirmed"
    }
}

/// `field` must differ from `other`
#[derive(Debug, Clone)]
pub struct DifferentValidator {
    pub field: String,
    /// The field it is compared with
    pub other: String,
}

impl DifferentValidator {
    pub fn new(field: impl Into<String>, other: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            other: other.into(),
        }
    }
}

#[async_trait]
impl ValidationRule for DifferentValidator {
    async fn validate(&self, data: &Value, _field: &str) -> ValidationResult<()> {
        let value = data.get(&self.field).unwrap_or(&Value::Null);
        if !value.is_null() && data.get(&self.other) == Some(value) {
            return Err(ValidationError::with_code(
                self.field.as_str(),
                format!("{} and {} must be different", self.field, self.other),
                "different",
            )
            .into());
        }
        Ok(())
    }

    fn rule_name(&self) -> &'static str {
        "different"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_confirmed() {
        let rule = ConfirmedValidator::new("newPassword");
        let ok = json!({"newPassword": "abcdef", "newPassword_confirmation": "abcdef"});
        let bad = json!({"newPassword": "abcdef"});

        assert!(rule.validate(&ok, "request").await.is_ok());
        let errors = rule.validate(&bad, "request").await.unwrap_err();
        assert!(errors.has_field_errors("newPassword"));
    }

    #[tokio::test]
    async fn test_different() {
        let rule = DifferentValidator::new("newPassword", "oldPassword");
        let same = json!({"newPassword": "abcdef", "oldPassword": "abcdef"});
        let changed = json!({"newPassword": "abcdeg", "oldPassword": "abcdef"});

        assert!(rule.validate(&same, "request").await.is_err());
        assert!(rule.validate(&changed, "request").await.is_ok());
    }
}
