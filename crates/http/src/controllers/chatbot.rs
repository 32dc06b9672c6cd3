//! `POST /chatbot/ask`

use crate::error::HttpResult;
use crate::extract::{coerce_numbers, JsonBody};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookstore_chatbot::{ChatFilters, ChatReply};
use bookstore_validation::{LengthValidator, NumericValidator, RequiredValidator, Rules};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

const FILTER_NUMBERS: &[&str] = &["minPrice", "maxPrice", "readingAge", "minReadingAge", "maxReadingAge"];

#[derive(Debug, Deserialize)]
struct AskRequest {
    message: String,
    #[serde(default)]
    filters: Option<ChatFilters>,
}

fn message_rules() -> Rules {
    Rules::new()
        .field("message", RequiredValidator::new())
        .field("message", LengthValidator::new().max(800))
}

fn filter_rules() -> Rules {
    let age = || NumericValidator::new().integer_only().range(0.0, 120.0);
    Rules::new()
        .field("category", LengthValidator::new().max(100))
        .field("language", LengthValidator::new().max(50))
        .field("minPrice", NumericValidator::new().min(0.0))
        .field("maxPrice", NumericValidator::new().min(0.0))
        .field("readingAge", age())
        .field("minReadingAge", age())
        .field("maxReadingAge", age())
}

/// Field errors keyed the way clients address them (`filters.minPrice`)
async fn validate(body: &Value) -> BTreeMap<String, Vec<String>> {
    let mut errors = match message_rules().validate(body).await {
        Ok(()) => BTreeMap::new(),
        Err(e) => e.field_messages(),
    };

    match body.get("filters") {
        None | Some(Value::Null) => {}
        Some(filters @ Value::Object(_)) => {
            if let Err(e) = filter_rules().validate(filters).await {
                for (field, messages) in e.field_messages() {
                    errors.insert(format!("filters.{}", field), messages);
                }
            }
        }
        Some(_) => {
            errors.insert("filters".to_string(), vec!["The filters field must be an object.".to_string()]);
        }
    }

    errors
}

fn rejected(errors: impl serde::Serialize) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": errors }))).into_response()
}

pub async fn ask(State(state): State<AppState>, JsonBody(mut body): JsonBody) -> HttpResult<Response> {
    if let Some(filters) = body.get_mut("filters") {
        coerce_numbers(filters, FILTER_NUMBERS);
    }

    let errors = validate(&body).await;
    if !errors.is_empty() {
        return Ok(rejected(errors));
    }

    let request: AskRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return Ok(rejected(json!({ "body": [e.to_string()] }))),
    };

    let reply = state
        .chatbot
        .ask(&request.message, request.filters.unwrap_or_default())
        .await?;

    Ok(match reply {
        ChatReply::Answered(answer) => Json(answer).into_response(),
        ChatReply::Unavailable(answer) => (StatusCode::INTERNAL_SERVER_ERROR, Json(answer)).into_response(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_question() {
        let body = json!({"message": "books for a 12 year old", "filters": {"maxPrice": 20}});
        assert!(validate(&body).await.is_empty());
    }

    #[tokio::test]
    async fn test_filter_errors_are_prefixed() {
        let body = json!({
            "message": "",
            "filters": {"minPrice": -1, "readingAge": 130, "language": "x".repeat(51)}
        });
        let errors = validate(&body).await;
        assert!(errors.contains_key("message"));
        assert!(errors.contains_key("filters.minPrice"));
        assert!(errors.contains_key("filters.readingAge"));
        assert!(errors.contains_key("filters.language"));
    }

    #[tokio::test]
    async fn test_filters_must_be_an_object() {
        let errors = validate(&json!({"message": "hi", "filters": "cheap"})).await;
        assert!(errors.contains_key("filters"));
    }

    #[tokio::test]
    async fn test_message_length_limit() {
        let errors = validate(&json!({"message": "a".repeat(801)})).await;
        assert!(errors.contains_key("message"));
    }
}
