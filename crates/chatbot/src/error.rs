use bookstore_orm::ModelError;
use thiserror::Error;

pub type ChatbotResult<T> = Result<T, ChatbotError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChatbotError {
    #[error("Book catalog error: {0}")]
    Catalog(String),

    #[error("LLM request failed: {0}")]
    LlmTransport(String),

    #[error("LLM endpoint returned HTTP {0}")]
    LlmStatus(u16),

    /// Reachable endpoint, but no text where the answer should be
    #[error("LLM endpoint returned no content")]
    LlmEmpty,

    /// Every completion endpoint failed
    #[error("The recommendation system is currently unavailable")]
    Unavailable,

    #[error("Chatbot configuration error: {0}")]
    Configuration(String),
}

impl From<ModelError> for ChatbotError {
    fn from(err: ModelError) -> Self {
        ChatbotError::Catalog(err.to_string())
    }
}

impl From<reqwest::Error> for ChatbotError {
    fn from(err: reqwest::Error) -> Self {
        ChatbotError::LlmTransport(err.to_string())
    }
}
