//! Tiered book retrieval.
//!
//! Each tier relaxes the filters a little more (age, then category or price)
//! and the first tier that returns anything wins. When every tier comes back
//! empty, the best-selling shelf in business order is returned instead.

use crate::catalog::{BookCatalog, CatalogBook};
use crate::error::ChatbotResult;
use crate::filters::ChatFilters;
use bookstore_core::money;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

const DESCRIPTION_LIMIT: usize = 220;

const STOPWORDS: &[&str] = &[
    "i", "am", "im", "looking", "for", "a", "an", "the", "good", "book", "books", "recommend",
    "recommendation", "that", "which", "cost", "costs", "price", "priced", "under", "below",
    "over", "above", "upper", "between", "and", "to", "dollar", "dollars", "usd", "cheap",
    "affordable", "best", "any", "some", "me", "please",
];

static CURRENCY_SIGNS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[$€£¥]").ok());
static NUMBERS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").ok());

/// Message patterns mapped to the word boosted in descriptions
static PURPOSES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\b(study|exam|textbook|school|course|learn|reference)\b", "study"),
        (r"\b(self[- ]?help|self development|productivity|mindset|habits|growth)\b", "self-help"),
        (r"\b(life skills|communication|confidence|parenting|leadership|soft skills)\b", "life skills"),
        (r"\b(fun|entertain|relax|story|novel|fiction)\b", "novel"),
    ]
    .into_iter()
    .filter_map(|(pattern, purpose)| Regex::new(pattern).ok().map(|re| (re, purpose)))
    .collect()
});

/// Description keywords per purpose tag
const PURPOSE_TAGS: &[(&str, &[&str])] = &[
    (
        "study",
        &["textbook", "curriculum", "exam", "practice", "lesson", "reference", "guide", "introduction to"],
    ),
    (
        "self-development",
        &["self-help", "habits", "mindset", "productivity", "success", "motivation", "personal growth"],
    ),
    (
        "life-skills",
        &["communication", "relationships", "confidence", "leadership", "soft skills", "life skills", "parenting"],
    ),
    (
        "entertainment",
        &["novel", "story", "thriller", "mystery", "romance", "fantasy", "adventure", "fiction"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Keyword search when the message names a topic, filters only otherwise
    Auto,
    Keyword,
    FilterOnly,
}

/// A retrieved book as handed to the prompt and the answer builder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: f64,
    pub discount: f64,
    pub final_price: f64,
    pub quantity: i32,
    pub reading_age: i32,
    pub purpose_tags: Vec<&'static str>,
    /// Whitespace collapsed, cut at 220 characters
    pub description: String,
}

impl From<CatalogBook> for RetrievedBook {
    fn from(book: CatalogBook) -> Self {
        let description = condense(&book.description);
        let discount = book.discount.max(0.0);
        Self {
            id: book.id,
            purpose_tags: purpose_tags(&description),
            title: book.title,
            author: book.author,
            category: book.category,
            price: money::round2(book.price),
            discount: money::round2(discount),
            final_price: money::final_price(book.price, discount),
            quantity: book.quantity,
            reading_age: book.reading_age,
            description,
        }
    }
}

fn condense(description: &str) -> String {
    let collapsed = description.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > DESCRIPTION_LIMIT {
        let cut: String = collapsed.chars().take(DESCRIPTION_LIMIT).collect();
        format!("{}...", cut)
    } else {
        collapsed
    }
}

pub fn purpose_tags(description: &str) -> Vec<&'static str> {
    let lower = description.to_lowercase();
    PURPOSE_TAGS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(tag, _)| *tag)
        .collect()
}

/// Word looked for in descriptions to boost books that fit the reader's goal
pub fn infer_purpose(lower: &str) -> Option<&'static str> {
    PURPOSES
        .iter()
        .find(|(re, _)| re.is_match(lower))
        .map(|(_, purpose)| *purpose)
}

/// True when the message carries a topic beyond prices, numbers and filler
pub fn has_meaningful_keyword(lower: &str) -> bool {
    let mut text = lower.to_string();
    for re in [&CURRENCY_SIGNS, &NUMBERS] {
        if let Some(re) = re.as_ref() {
            text = re.replace_all(&text, " ").into_owned();
        }
    }

    let topical = text
        .split_whitespace()
        .filter(|word| word.chars().count() >= 4 && !STOPWORDS.contains(word))
        .count();

    topical > 0
}

/// Filter sets to try in order, duplicates removed
pub fn fallback_tiers(filters: &ChatFilters) -> Vec<ChatFilters> {
    let mut tiers = vec![filters.clone()];

    if filters.has_age() {
        tiers.push(filters.without_age());
    }
    if filters.has_category() && filters.has_price() {
        tiers.push(filters.without_category());
        tiers.push(filters.without_price());
    }
    if filters.has_price() {
        tiers.push(ChatFilters {
            language: None,
            ..filters.without_category().without_age()
        });
    }

    let mut unique: Vec<ChatFilters> = Vec::with_capacity(tiers.len());
    for tier in tiers {
        if !unique.contains(&tier) {
            unique.push(tier);
        }
    }
    unique
}

#[derive(Clone)]
pub struct BookRetriever {
    catalog: Arc<dyn BookCatalog>,
}

impl BookRetriever {
    pub fn new(catalog: Arc<dyn BookCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn search(
        &self,
        message: &str,
        filters: &ChatFilters,
        limit: i64,
        strategy: Strategy,
    ) -> ChatbotResult<Vec<RetrievedBook>> {
        let filters = &filters.for_retrieval();
        let lower = message.to_lowercase();
        let meaningful = has_meaningful_keyword(&lower);

        let strategy = match strategy {
            Strategy::Auto if (filters.has_price() || filters.has_age() || filters.has_category()) && !meaningful => {
                Strategy::FilterOnly
            }
            Strategy::Auto => Strategy::Keyword,
            explicit => explicit,
        };
        let purpose = infer_purpose(&lower);

        for (tier, tier_filters) in fallback_tiers(filters).iter().enumerate() {
            let rows = if strategy == Strategy::Keyword && meaningful {
                self.catalog.keyword(tier_filters, message, purpose, limit).await?
            } else {
                self.catalog.filtered(tier_filters, limit).await?
            };

            if !rows.is_empty() {
                tracing::debug!(tier, ?strategy, found = rows.len(), "Chatbot retrieval tier matched");
                return Ok(rows.into_iter().map(RetrievedBook::from).collect());
            }
        }

        tracing::debug!(?strategy, "No retrieval tier matched, falling back to catalog order");
        let rows = self.catalog.filtered(&ChatFilters::default(), limit).await?;
        Ok(rows.into_iter().map(RetrievedBook::from).collect())
    }
}
