use crate::retrieval::RetrievedBook;
use serde_json::{json, Value};

pub const TEMPERATURE: f64 = 0.1;
pub const CHAT_MAX_TOKENS: u32 = 220;
/// Token budget for the raw-prompt endpoints
pub const COMPLETION_MAX_TOKENS: u32 = 260;

const SYSTEM_PROMPT: &str = r#"You are a bookstore recommendation assistant.

STRICT RULES (VERY IMPORTANT):
- You MUST use ONLY the books listed in CONTEXT.
- You MUST NOT invent books, authors, or topics not present in CONTEXT.
- You MUST NOT use any external knowledge.
- If CONTEXT contains only ONE book, you MUST recommend ONLY that book.
- If there is no suitable book, say clearly: "Currently, we do not have a suitable book for this topic."

HOW TO ANSWER:
- Write in natural, friendly English.
- Recommend ONLY 1–2 books.
- For each book, give ONE short reason.
- Do NOT list technical details.
- Do NOT mention prices, IDs, or stock in the answer text.
- The answer MUST be a complete sentence (not just a book title).

OUTPUT FORMAT (JSON ONLY, no extra text):
{
  "answer": "natural recommendation text (1–2 sentences)",
  "suggestions": [
    { "id": 1 }
  ]
}"#;

/// System and user turns for one recommendation question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Context is kept to id, title and category per book
    pub fn build(message: &str, books: &[RetrievedBook]) -> Self {
        let context: String = books
            .iter()
            .map(|book| format!("- ({}) {} | {}\n", book.id, book.title, book.category))
            .collect();

        Self {
            system: SYSTEM_PROMPT.to_string(),
            user: format!(
                "Customer question:\n{}\n\nAvailable books (CONTEXT):\n{}",
                message, context
            ),
        }
    }

    /// Single-string form for completion endpoints without chat roles
    pub fn flattened(&self) -> String {
        format!("{}\n\n{}\n\nASSISTANT:", self.system, self.user)
    }

    /// OpenAI-style chat completion body
    pub fn chat_body(&self, model: &str) -> Value {
        json!({
            "model": model,
            "messages": [
                {"role": "system", "content": self.system},
                {"role": "user", "content": self.user},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": CHAT_MAX_TOKENS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str, category: &str) -> RetrievedBook {
        RetrievedBook {
            id,
            title: title.to_string(),
            author: "A".to_string(),
            category: category.to_string(),
            price: 10.0,
            discount: 0.0,
            final_price: 10.0,
            quantity: 1,
            reading_age: 12,
            purpose_tags: vec![],
            description: String::new(),
        }
    }

    #[test]
    fn test_user_turn_lists_context() {
        let prompt = Prompt::build(
            "Something with dragons?",
            &[book(3, "Dragon Rider", "Fantasy"), book(9, "Eragon", "Fantasy")],
        );
        assert_eq!(
            prompt.user,
            "Customer question:\nSomething with dragons?\n\nAvailable books (CONTEXT):\n\
             - (3) Dragon Rider | Fantasy\n- (9) Eragon | Fantasy\n"
        );
        assert!(prompt.system.starts_with("You are a bookstore recommendation assistant."));
        assert!(prompt.flattened().ends_with("| Fantasy\n\n\nASSISTANT:"));
    }

    #[test]
    fn test_chat_body() {
        let body = Prompt::build("hi", &[]).chat_body("local");
        assert_eq!(body["model"], "local");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["temperature"], 0.1);
        assert_eq!(body["max_tokens"], 220);
    }
}
