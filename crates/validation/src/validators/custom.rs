//! Closure-backed rules for one-off checks

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

type CheckFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Fails with `message` when the predicate returns false. Null values pass.
#[derive(Clone)]
pub struct CustomValidator {
    /// Error code reported with the failure
    pub name: String,
    check: CheckFn,
    /// Message reported when the predicate fails
    pub message: String,
}

impl CustomValidator {
    /// Wrap a predicate over the raw JSON value
    pub fn new<F>(name: impl Into<String>, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
            message: message.into(),
        }
    }
}

impl std::fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomValidator")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

#[async_trait]
impl ValidationRule for CustomValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        if value.is_null() || (self.check)(value) {
            Ok(())
        } else {
            Err(ValidationError::with_code(field, self.message.clone(), self.name.clone()).into())
        }
    }

    fn rule_name(&self) -> &'static str {
        "custom"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_predicate() {
        let rule = CustomValidator::new("roles_array", "roles must be a list of names", |v| {
            v.as_array()
                .is_some_and(|items| items.iter().all(Value::is_string))
        });

        assert!(rule.validate(&json!(["ROLE_ADMIN"]), "roles").await.is_ok());
        assert!(rule.validate(&json!(null), "roles").await.is_ok());
        let errors = rule.validate(&json!("ROLE_ADMIN"), "roles").await.unwrap_err();
        assert_eq!(errors.errors["roles"][0].code, "roles_array");
    }
}
