//! # bookstore-chatbot
//!
//! Book recommendations without a vector store: the customer message is
//! parsed into filters, matching books are pulled from the catalog through a
//! tiered fallback, and either a deterministic answer is assembled or a local
//! LLM is asked to pick from the retrieved books.

pub mod answer;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod intent;
pub mod llm;
pub mod prompt;
pub mod retrieval;
pub mod service;

pub use answer::{ChatAnswer, Suggestion};
pub use catalog::{BookCatalog, CatalogBook, PgBookCatalog};
pub use config::ChatbotConfig;
pub use error::{ChatbotError, ChatbotResult};
pub use filters::ChatFilters;
pub use llm::{Completion, LlamaClient};
pub use prompt::Prompt;
pub use retrieval::{BookRetriever, RetrievedBook, Strategy};
pub use service::{ChatReply, ChatbotService};
