//! Per-endpoint rule sets

use crate::error::{ValidationErrors, ValidationResult};
use crate::traits::ValidationRule;
use serde_json::Value;
use std::sync::Arc;

/// Ordered field rules plus request-level (cross-field) rules
#[derive(Clone, Default)]
pub struct Rules {
    field_rules: Vec<(String, Vec<Arc<dyn ValidationRule>>)>,
    request_rules: Vec<Arc<dyn ValidationRule>>,
}

impl std::fmt::Debug for Rules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rules")
            .field("fields", &self.validated_fields())
            .field("request_rules_count", &self.request_rules.len())
            .finish()
    }
}

impl Rules {
    /// Empty rule set; every body passes
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `field`
    pub fn field<R>(mut self, field: impl Into<String>, rule: R) -> Self
    where
        R: ValidationRule + 'static,
    {
        let field = field.into();
        let rule: Arc<dyn ValidationRule> = Arc::new(rule);
        match self.field_rules.iter_mut().find(|(name, _)| *name == field) {
            Some((_, rules)) => rules.push(rule),
            None => self.field_rules.push((field, vec![rule])),
        }
        self
    }

    /// Add a cross-field rule that sees the whole body
    pub fn request<R>(mut self, rule: R) -> Self
    where
        R: ValidationRule + 'static,
    {
        self.request_rules.push(Arc::new(rule));
        self
    }

    /// Fields with at least one rule, in registration order
    pub fn validated_fields(&self) -> Vec<&str> {
        self.field_rules.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.field_rules.is_empty() && self.request_rules.is_empty()
    }

    /// Run every rule against `data`. Fields missing from the body are
    /// checked as `Null`, so `required` catches them and optional rules skip them.
    pub async fn validate(&self, data: &Value) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();

        for (field, rules) in &self.field_rules {
            let value = data.get(field).unwrap_or(&Value::Null);
            for rule in rules {
                if let Err(rule_errors) = rule.validate(value, field).await {
                    errors.merge(rule_errors);
                }
            }
        }

        for rule in &self.request_rules {
            if let Err(rule_errors) = rule.validate(data, "request").await {
                errors.merge(rule_errors);
            }
        }

        errors.into_result()
    }
}
