//! HTTP error type and its `{message, errors}` response body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookstore_auth::AuthError;
use bookstore_chatbot::ChatbotError;
use bookstore_orm::ModelError;
use bookstore_payments::PaymentError;
use bookstore_validation::ValidationErrors;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for handlers and services
pub type HttpResult<T> = Result<T, HttpError>;

/// An error response: status, top-level message and per-field messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
    errors: BTreeMap<String, Vec<String>>,
}

impl HttpError {
    pub fn new<T: Into<String>>(status: StatusCode, message: T) -> Self {
        Self {
            status,
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    /// Attach a message to `field`
    pub fn with_error<F: Into<String>, M: Into<String>>(mut self, field: F, message: M) -> Self {
        self.errors.entry(field.into()).or_default().push(message.into());
        self
    }

    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 400 for a required query parameter that is absent
    pub fn missing_parameter(name: &str) -> Self {
        Self::bad_request(format!("Missing parameter: {}", name))
            .with_error(name, format!("The {} parameter is required.", name))
    }

    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated")
            .with_error("auth", "Token is missing or invalid.")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }

    /// 403 with the reason under `auth`
    pub fn forbidden<T: Into<String>>(reason: T) -> Self {
        Self::new(StatusCode::FORBIDDEN, "Access denied").with_error("auth", reason)
    }

    /// 404 `"<Resource> not found"` with `{<resource>: ["<Resource> not found."]}`
    pub fn not_found(resource: &str) -> Self {
        let label = capitalize(resource);
        Self::new(StatusCode::NOT_FOUND, format!("{} not found", label))
            .with_error(resource, format!("{} not found.", label))
    }

    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable<T: Into<String>>(message: T) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Validation failed".to_string(),
            errors: errors.field_messages(),
        }
    }

    pub fn too_many_requests(retry_after: u64) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Attempts.")
            .with_error("throttle", format!("Retry after {} seconds.", retry_after))
    }

    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Database error").with_error("database", message)
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error").with_error("server", message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<ModelError> for HttpError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UniqueViolation { .. } => HttpError::conflict("Duplicate key")
                .with_error("duplicate", "A unique constraint was violated."),
            ModelError::NotFound(_) => HttpError::not_found("record"),
            ModelError::Query(message) => HttpError::bad_request(message),
            other => HttpError::database(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for HttpError {
    fn from(err: sqlx::Error) -> Self {
        HttpError::from(ModelError::from(err))
    }
}

impl From<AuthError> for HttpError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => HttpError::invalid_credentials(),
            AuthError::MissingToken | AuthError::TokenError { .. } | AuthError::TokenRevoked => {
                HttpError::unauthenticated()
            }
            AuthError::AccessDenied { message } => HttpError::forbidden(message),
            other => HttpError::internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for HttpError {
    fn from(errors: ValidationErrors) -> Self {
        HttpError::validation(errors)
    }
}

impl From<PaymentError> for HttpError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidSignature => {
                HttpError::bad_request("Invalid signature").with_error("signature", err.to_string())
            }
            other => HttpError::internal(other.to_string()),
        }
    }
}

impl From<ChatbotError> for HttpError {
    fn from(err: ChatbotError) -> Self {
        HttpError::internal(err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                message = %self.message,
                errors = ?self.errors,
                "Request failed"
            );
        }

        let body = json!({
            "message": self.message,
            "errors": self.errors,
        });

        (self.status, Json(body)).into_response()
    }
}
