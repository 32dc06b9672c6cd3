//! Core validation trait

use crate::error::ValidationResult;
use async_trait::async_trait;
use serde_json::Value;

/// A single check. Field rules receive the field's value (`Null` when the
/// field is absent); request rules receive the whole body with field `"request"`.
#[async_trait]
pub trait ValidationRule: Send + Sync {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()>;

    fn rule_name(&self) -> &'static str;
}
