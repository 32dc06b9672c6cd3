//! `YYYY-MM-DD` dates with an optional upper bound

use crate::error::{ValidationError, ValidationErrors, ValidationResult};
use crate::traits::ValidationRule;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

/// Accepted input format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Strings in [`DATE_FORMAT`]. Null passes.
#[derive(Debug, Clone, Default)]
pub struct DateValidator {
    /// Reject dates after the current UTC day
    pub not_in_future: bool,
    pub message: Option<String>,
}

impl DateValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject dates after today
    pub fn not_in_future(mut self) -> Self {
        self.not_in_future = true;
        self
    }

    fn check(&self, raw: &str, today: NaiveDate) -> Result<(), (&'static str, &'static str)> {
        let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map_err(|_| ("date", "must be a valid date (YYYY-MM-DD)"))?;
        if self.not_in_future && date > today {
            return Err(("before_or_equal", "must be a date before or equal to today"));
        }
        Ok(())
    }
}

#[async_trait]
impl ValidationRule for DateValidator {
    async fn validate(&self, value: &Value, field: &str) -> ValidationResult<()> {
        let outcome = match value {
            Value::Null => return Ok(()),
            Value::String(s) => self.check(s, Utc::now().date_naive()),
            _ => Err(("date", "must be a valid date (YYYY-MM-DD)")),
        };

        outcome.map_err(|(code, reason)| {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} {}", field, reason));
            ValidationErrors::from(ValidationError::with_code(field, message, code))
        })
    }

    fn rule_name(&self) -> &'static str {
        "date"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_against_fixed_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let validator = DateValidator::new().not_in_future();

        assert!(validator.check("2024-06-01", today).is_ok());
        assert!(validator.check("1965-08-01", today).is_ok());
        assert_eq!(validator.check("2024-06-02", today).unwrap_err().0, "before_or_equal");
        assert_eq!(validator.check("01/06/2024", today).unwrap_err().0, "date");
    }

    #[tokio::test]
    async fn test_future_dates_allowed_without_bound() {
        let validator = DateValidator::new();
        assert!(validator
            .validate(&serde_json::json!("2999-01-01"), "publicationDate")
            .await
            .is_ok());
    }
}
