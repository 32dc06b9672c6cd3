//! Customer-facing answers: deterministic ones for price and age questions,
//! and the parsing of whatever the LLM sends back.

use crate::filters::ChatFilters;
use crate::retrieval::RetrievedBook;
use bookstore_core::money::format_usd;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NO_SUITABLE_BOOK: &str = "Currently, we do not have a suitable book for this topic.";
pub const UNAVAILABLE: &str =
    "The recommendation system is currently unavailable. Please try again later.";

/// Books named in an answer
const PICKS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub suggestions: Vec<Suggestion>,
}

impl ChatAnswer {
    pub fn new(answer: impl Into<String>, suggestions: Vec<Suggestion>) -> Self {
        Self {
            answer: answer.into(),
            suggestions,
        }
    }

    pub fn no_suitable_book() -> Self {
        Self::new(NO_SUITABLE_BOOK, Vec::new())
    }

    pub fn unavailable() -> Self {
        Self::new(UNAVAILABLE, Vec::new())
    }

    /// "Based on what we have, I suggest A ($x) and B ($y)."
    pub fn top_picks(books: &[RetrievedBook]) -> Self {
        let (named, suggestions) = picks(books);
        Self::new(format!("Based on what we have, I suggest {}.", named), suggestions)
    }
}

/// `"A ($1.00) and B ($2.00)"` for the first two books, with their ids
fn picks(books: &[RetrievedBook]) -> (String, Vec<Suggestion>) {
    let picked = &books[..books.len().min(PICKS)];
    let named = picked
        .iter()
        .map(|book| format!("{} (${})", book.title, format_usd(book.final_price)))
        .collect::<Vec<_>>()
        .join(" and ");
    let suggestions = picked.iter().map(|book| Suggestion { id: book.id }).collect();
    (named, suggestions)
}

fn suggestions_for(books: &[RetrievedBook]) -> Vec<Suggestion> {
    picks(books).1
}

/// Whether `book` honours the price and reading-age filters. A reading-age
/// range takes precedence over the single age.
pub fn satisfies(book: &RetrievedBook, filters: &ChatFilters) -> bool {
    let price = book.final_price;
    let age = book.reading_age;

    if filters.min_price.is_some_and(|min| price < min) || filters.max_price.is_some_and(|max| price > max) {
        return false;
    }
    if filters.has_age_range() {
        return !(filters.min_reading_age.is_some_and(|min| age < min)
            || filters.max_reading_age.is_some_and(|max| age > max));
    }
    !filters.reading_age.is_some_and(|limit| age > limit)
}

/// "ages 12–16, under $20.00, above $5.00"
pub fn describe_constraints(filters: &ChatFilters) -> String {
    let mut wanted = Vec::new();

    match (filters.min_reading_age, filters.max_reading_age, filters.reading_age) {
        (Some(min), Some(max), _) => wanted.push(format!("ages {}–{}", min, max)),
        (Some(min), None, _) => wanted.push(format!("age {}+", min)),
        (None, Some(max), _) | (None, None, Some(max)) => wanted.push(format!("up to age {}", max)),
        (None, None, None) => {}
    }
    if let Some(max) = filters.max_price {
        wanted.push(format!("under ${}", format_usd(max)));
    }
    if let Some(min) = filters.min_price {
        wanted.push(format!("above ${}", format_usd(min)));
    }

    wanted.join(", ")
}

/// Answer a price or age question straight from the retrieved books
pub fn constrained_answer(filters: &ChatFilters, books: &[RetrievedBook]) -> ChatAnswer {
    let matched: Vec<RetrievedBook> = books
        .iter()
        .filter(|book| satisfies(book, filters))
        .cloned()
        .collect();

    if !matched.is_empty() {
        let (named, suggestions) = picks(&matched);
        return ChatAnswer::new(
            format!(
                "Here are good options ({}): {}.",
                describe_constraints(filters),
                named
            ),
            suggestions,
        );
    }

    if books.is_empty() {
        return ChatAnswer::no_suitable_book();
    }

    let (named, suggestions) = picks(books);
    ChatAnswer::new(
        format!(
            "We currently don't have books matching ({}). The closest options we have are {}.",
            describe_constraints(filters),
            named
        ),
        suggestions,
    )
}

/// First balanced `{...}` in `text`, ignoring code fences and braces inside
/// JSON strings
pub fn extract_first_json_object(text: &str) -> Option<String> {
    let cleaned = text.replace("```json", "").replace("```JSON", "").replace("```", "");
    let start = cleaned.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in cleaned[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(cleaned[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn suggestion_id(value: &Value) -> Option<i64> {
    match value.get("id")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Turn raw model output into an answer. Falls back to naming the top two
/// books when the output has no usable `answer`.
pub fn from_model_output(raw: &str, books: &[RetrievedBook]) -> ChatAnswer {
    let parsed = extract_first_json_object(raw.trim())
        .and_then(|json| serde_json::from_str::<Value>(&json).ok());

    let answer = parsed
        .as_ref()
        .and_then(|data| data.get("answer"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|answer| !answer.is_empty());

    let Some(answer) = answer else {
        return ChatAnswer::top_picks(books);
    };

    let mut suggestions: Vec<Suggestion> = parsed
        .as_ref()
        .and_then(|data| data.get("suggestions"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(suggestion_id)
                .map(|id| Suggestion { id })
                .collect()
        })
        .unwrap_or_default();

    if suggestions.is_empty() {
        suggestions = suggestions_for(books);
    }
    ChatAnswer::new(answer, suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str, final_price: f64, reading_age: i32) -> RetrievedBook {
        RetrievedBook {
            id,
            title: title.to_string(),
            author: "A".to_string(),
            category: "Fiction".to_string(),
            price: final_price,
            discount: 0.0,
            final_price,
            quantity: 1,
            reading_age,
            purpose_tags: vec![],
            description: String::new(),
        }
    }

    fn shelf() -> Vec<RetrievedBook> {
        vec![
            book(1, "Holes", 8.5, 10),
            book(2, "Dune", 1250.0, 16),
            book(3, "Matilda", 6.0, 8),
        ]
    }

    #[test]
    fn test_describe_constraints() {
        let range = ChatFilters {
            min_reading_age: Some(12),
            max_reading_age: Some(16),
            max_price: Some(20.0),
            min_price: Some(5.0),
            ..ChatFilters::default()
        };
        assert_eq!(describe_constraints(&range), "ages 12–16, under $20.00, above $5.00");

        let single = ChatFilters {
            reading_age: Some(10),
            ..ChatFilters::default()
        };
        assert_eq!(describe_constraints(&single), "up to age 10");

        let min_only = ChatFilters {
            min_reading_age: Some(14),
            reading_age: Some(3),
            ..ChatFilters::default()
        };
        assert_eq!(describe_constraints(&min_only), "age 14+");
    }

    #[test]
    fn test_matches_answer_names_two_books() {
        let filters = ChatFilters {
            max_price: Some(10.0),
            ..ChatFilters::default()
        };
        let answer = constrained_answer(&filters, &shelf());
        assert_eq!(
            answer.answer,
            "Here are good options (under $10.00): Holes ($8.50) and Matilda ($6.00)."
        );
        assert_eq!(answer.suggestions, vec![Suggestion { id: 1 }, Suggestion { id: 3 }]);
    }

    #[test]
    fn test_age_range_overrides_single_age() {
        let filters = ChatFilters {
            reading_age: Some(8),
            min_reading_age: Some(15),
            ..ChatFilters::default()
        };
        let answer = constrained_answer(&filters, &shelf());
        assert_eq!(answer.answer, "Here are good options (age 15+): Dune ($1,250.00).");
    }

    #[test]
    fn test_no_match_offers_closest() {
        let filters = ChatFilters {
            max_price: Some(2.0),
            ..ChatFilters::default()
        };
        let answer = constrained_answer(&filters, &shelf());
        assert_eq!(
            answer.answer,
            "We currently don't have books matching (under $2.00). The closest options we have are Holes ($8.50) and Dune ($1,250.00)."
        );
        assert_eq!(constrained_answer(&filters, &[]), ChatAnswer::no_suitable_book());
    }

    #[test]
    fn test_extract_first_json_object() {
        let raw = "Sure!\n```json\n{\"answer\": \"Try {this}\", \"suggestions\": [{\"id\": 2}]}\n```\n{\"second\": 1}";
        assert_eq!(
            extract_first_json_object(raw).as_deref(),
            Some("{\"answer\": \"Try {this}\", \"suggestions\": [{\"id\": 2}]}")
        );
        assert_eq!(
            extract_first_json_object(r#"{"a": "quote \" and } brace"}"#).as_deref(),
            Some(r#"{"a": "quote \" and } brace"}"#)
        );
        assert_eq!(extract_first_json_object("no json {"), None);
        assert_eq!(extract_first_json_object("plain text"), None);
    }

    #[test]
    fn test_model_output_with_suggestions() {
        let raw = r#"{"answer": " Dune is a classic. ", "suggestions": [{"id": 2}, {"id": "3"}, {"x": 1}]}"#;
        let answer = from_model_output(raw, &shelf());
        assert_eq!(answer.answer, "Dune is a classic.");
        assert_eq!(answer.suggestions, vec![Suggestion { id: 2 }, Suggestion { id: 3 }]);
    }

    #[test]
    fn test_model_output_without_suggestions_uses_top_books() {
        let answer = from_model_output(r#"{"answer": "Read Holes."}"#, &shelf());
        assert_eq!(answer.suggestions, vec![Suggestion { id: 1 }, Suggestion { id: 2 }]);
    }

    #[test]
    fn test_unparseable_output_falls_back() {
        let answer = from_model_output("I think you would like Holes", &shelf());
        assert_eq!(
            answer.answer,
            "Based on what we have, I suggest Holes ($8.50) and Dune ($1,250.00)."
        );
    }
}
