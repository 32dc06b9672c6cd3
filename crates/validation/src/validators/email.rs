//! Email address format

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static EMAIL_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9._%+-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}$",
    )
    .ok()
});

/// `local@domain.tld` with length limits on both parts. Null passes.
#[derive(Debug, Clone, Default)]
pub struct EmailValidator {
    /// Custom error message
    pub message: Option<String>,
}

impl EmailValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format check alone, usable outside a rule set
    pub fn is_valid(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };
        local.len() <= 64
            && domain.len() <= 253
            && !email.contains("..")
            && EMAIL_PATTERN
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(email))
    }
}

#[async_trait]
impl ValidationRule for EmailValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        let valid = match value {
            Value::Null => return Ok(()),
            Value::String(s) => Self::is_valid(s.trim()),
            _ => false,
        };

        if valid {
            Ok(())
        } else {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} must be a valid email address", field));
            Err(ValidationError::with_code(field, message, "email").into())
        }
    }

    fn rule_name(&self) -> &'static str {
        "email"
    }
}
