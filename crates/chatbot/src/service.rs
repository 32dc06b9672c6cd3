use crate::answer::{self, ChatAnswer};
use crate::catalog::BookCatalog;
use crate::error::{ChatbotError, ChatbotResult};
use crate::filters::ChatFilters;
use crate::intent;
use crate::llm::Completion;
use crate::prompt::Prompt;
use crate::retrieval::{BookRetriever, Strategy};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(50);

/// Outcome of a question. `Unavailable` still carries the apology text the
/// client shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Answered(ChatAnswer),
    Unavailable(ChatAnswer),
}

impl ChatReply {
    pub fn is_available(&self) -> bool {
        matches!(self, ChatReply::Answered(_))
    }

    pub fn answer(&self) -> &ChatAnswer {
        match self {
            ChatReply::Answered(answer) | ChatReply::Unavailable(answer) => answer,
        }
    }

    pub fn into_answer(self) -> ChatAnswer {
        match self {
            ChatReply::Answered(answer) | ChatReply::Unavailable(answer) => answer,
        }
    }
}

#[derive(Clone)]
pub struct ChatbotService {
    retriever: BookRetriever,
    llm: Arc<dyn Completion>,
    top_n: i64,
    /// Budget for the whole LLM endpoint chain
    deadline: Duration,
}

impl ChatbotService {
    pub fn new(catalog: Arc<dyn BookCatalog>, llm: Arc<dyn Completion>, top_n: i64) -> Self {
        Self {
            retriever: BookRetriever::new(catalog),
            llm,
            top_n: top_n.max(1),
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn ask(&self, message: &str, filters: ChatFilters) -> ChatbotResult<ChatReply> {
        let filters = intent::infer(message, filters.normalized());
        tracing::debug!(?filters, "Chatbot filters resolved");

        let books = self
            .retriever
            .search(message, &filters, self.top_n, Strategy::Auto)
            .await?;

        // Price and age are never left to the model
        if filters.has_price() || filters.has_age() {
            return Ok(ChatReply::Answered(answer::constrained_answer(&filters, &books)));
        }

        if books.is_empty() {
            return Ok(ChatReply::Answered(ChatAnswer::no_suitable_book()));
        }

        let prompt = Prompt::build(message, &books);
        match tokio::time::timeout(self.deadline, self.llm.complete(&prompt)).await {
            Ok(Ok(raw)) => Ok(ChatReply::Answered(answer::from_model_output(&raw, &books))),
            Ok(Err(ChatbotError::Unavailable)) => {
                tracing::error!("Every LLM endpoint failed");
                Ok(ChatReply::Unavailable(ChatAnswer::unavailable()))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::error!(deadline_secs = self.deadline.as_secs_f64(), "LLM did not answer in time");
                Ok(ChatReply::Unavailable(ChatAnswer::unavailable()))
            }
        }
    }
}
