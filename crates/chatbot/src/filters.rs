use serde::{Deserialize, Serialize};

/// Structured constraints on a recommendation, either sent by the client or
/// inferred from the message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    /// Upper bound on the book's reading age
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_reading_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_reading_age: Option<i32>,
}

impl ChatFilters {
    /// Blank strings count as absent
    pub fn normalized(mut self) -> Self {
        for slot in [&mut self.category, &mut self.language] {
            if slot.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *slot = None;
            }
        }
        self
    }

    pub fn has_price(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    /// Any age constraint, the range included
    pub fn has_age(&self) -> bool {
        self.reading_age.is_some() || self.has_age_range()
    }

    pub fn has_age_range(&self) -> bool {
        self.min_reading_age.is_some() || self.max_reading_age.is_some()
    }

    pub fn has_category(&self) -> bool {
        self.category.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// The filters the catalog is queried with. An age range only shapes
    /// the final answer; retrieval filters on `reading_age` alone.
    pub fn for_retrieval(&self) -> Self {
        Self {
            min_reading_age: None,
            max_reading_age: None,
            ..self.clone()
        }
    }

    pub fn without_age(&self) -> Self {
        Self {
            reading_age: None,
            min_reading_age: None,
            max_reading_age: None,
            ..self.clone()
        }
    }

    pub fn without_category(&self) -> Self {
        Self {
            category: None,
            ..self.clone()
        }
    }

    pub fn without_price(&self) -> Self {
        Self {
            min_price: None,
            max_price: None,
            ..self.clone()
        }
    }

    /// Only the price bounds
    pub fn price_only(&self) -> Self {
        Self {
            min_price: self.min_price,
            max_price: self.max_price,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_camel_case() {
        let filters: ChatFilters = serde_json::from_value(serde_json::json!({
            "category": "Fantasy",
            "maxPrice": 20,
            "minReadingAge": 12
        }))
        .unwrap();
        assert_eq!(filters.category.as_deref(), Some("Fantasy"));
        assert_eq!(filters.max_price, Some(20.0));
        assert_eq!(filters.min_reading_age, Some(12));
        assert!(filters.has_price() && filters.has_age() && filters.has_category());
    }

    #[test]
    fn test_blank_strings_are_dropped() {
        let filters = ChatFilters {
            category: Some("  ".to_string()),
            language: Some("English".to_string()),
            ..ChatFilters::default()
        }
        .normalized();
        assert!(filters.category.is_none());
        assert_eq!(filters.language.as_deref(), Some("English"));
    }

    #[test]
    fn test_retrieval_filters_drop_the_age_range() {
        let filters = ChatFilters {
            category: Some("Fantasy".to_string()),
            reading_age: Some(12),
            min_reading_age: Some(10),
            max_reading_age: Some(14),
            ..ChatFilters::default()
        };
        let retrieval = filters.for_retrieval();
        assert_eq!(retrieval.reading_age, Some(12));
        assert!(!retrieval.has_age_range());
        assert!(retrieval.has_category());
    }

    #[test]
    fn test_price_only_keeps_just_prices() {
        let filters = ChatFilters {
            category: Some("Romance".to_string()),
            language: Some("English".to_string()),
            min_price: Some(5.0),
            reading_age: Some(12),
            ..ChatFilters::default()
        };
        let price_only = filters.price_only();
        assert_eq!(price_only.min_price, Some(5.0));
        assert!(price_only.category.is_none() && price_only.language.is_none());
        assert!(!price_only.has_age());
    }
}
