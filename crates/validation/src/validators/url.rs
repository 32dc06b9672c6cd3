//! Absolute http(s) URL

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use serde_json::Value;

/// Strings that parse as http or https URLs with a host. Null passes.
#[derive(Debug, Clone, Default)]
pub struct UrlValidator {
    /// Custom error message
    pub message: Option<String>,
}

impl UrlValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(raw: &str) -> bool {
        match url::Url::parse(raw.trim()) {
            Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ValidationRule for UrlValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        let valid = match value {
            Value::Null => return Ok(()),
            Value::String(s) => Self::is_valid(s),
            _ => false,
        };

        if valid {
            Ok(())
        } else {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} must be a valid URL", field));
            Err(ValidationError::with_code(field, message, "url").into())
        }
    }

    fn rule_name(&self) -> &'static str {
        "url"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert!(UrlValidator::is_valid("https://cdn.example.com/covers/dune.jpg"));
        assert!(UrlValidator::is_valid("http://localhost:9000/a.png"));
        assert!(!UrlValidator::is_valid("ftp://example.com/a.png"));
        assert!(!UrlValidator::is_valid("covers/dune.jpg"));
    }
}
